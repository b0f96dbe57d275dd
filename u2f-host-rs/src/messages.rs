//! Assembly of U2F raw-message request bodies.
//!
//! Both operations commit to a 32-byte challenge parameter
//! (`SHA-256(clientDataJSON)`) and a 32-byte application parameter
//! (`SHA-256(appId)`); authentication appends the length-prefixed raw key
//! handle. The serialized clientData is kept alongside the body because the
//! caller needs to return it (encoded) with the device's response.
use crate::clientdata::{ClientData, CLIENT_DATA_TYPE_AUTHENTICATE, CLIENT_DATA_TYPE_REGISTER};
use crate::error::{Error, Result};
use crate::types::{AuthenticateRequest, RegisterRequest};
use crate::util::{compute_sha256, websafe_decode};

/// A request body, paired with the clientData bytes it commits to.
#[derive(Debug)]
pub(crate) struct RequestBody {
    pub client_data: Vec<u8>,
    pub body: Vec<u8>,
}

pub(crate) fn register_request_body(req: &RegisterRequest) -> Result<RequestBody> {
    let client_data = ClientData {
        typ: CLIENT_DATA_TYPE_REGISTER,
        challenge: &req.challenge,
        cid_pubkey: req.channel_id_public_key.as_ref(),
        origin: &req.facet,
    }
    .to_bytes()?;

    let mut body = Vec::with_capacity(64);
    body.extend_from_slice(&compute_sha256(&client_data));
    body.extend_from_slice(&compute_sha256(req.app_id.as_bytes()));
    Ok(RequestBody { client_data, body })
}

pub(crate) fn authenticate_request_body(req: &AuthenticateRequest) -> Result<RequestBody> {
    let key_handle = websafe_decode(&req.key_handle)?;
    if key_handle.len() > u8::MAX as usize {
        return Err(Error::KeyHandleTooLarge);
    }

    let client_data = ClientData {
        typ: CLIENT_DATA_TYPE_AUTHENTICATE,
        challenge: &req.challenge,
        cid_pubkey: req.channel_id_public_key.as_ref(),
        origin: &req.facet,
    }
    .to_bytes()?;

    let mut body = Vec::with_capacity(65 + key_handle.len());
    body.extend_from_slice(&compute_sha256(&client_data));
    body.extend_from_slice(&compute_sha256(req.app_id.as_bytes()));
    body.push(key_handle.len() as u8);
    body.extend_from_slice(&key_handle);
    Ok(RequestBody { client_data, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelIdPublicKey, JSONWebKey};
    use crate::util::websafe_encode;
    use hex_literal::hex;

    fn jwk() -> ChannelIdPublicKey {
        ChannelIdPublicKey::Key(JSONWebKey {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x: "HzQwlfXX7Q4S5MtCCnZUNBw3RMzPO9tOyWjBqRl4tJ8".to_string(),
            y: "XVguGFLIZx1fXg3wNqfdbn75hi4-_7-BxhMljw42Ht4".to_string(),
        })
    }

    #[test]
    fn authenticate_body_layout() {
        let req = AuthenticateRequest {
            challenge: "opsXqUifDriAAmWclinfbS0e-USY0CgyJHe_Otd7z8o".to_string(),
            app_id: "https://gstatic.com/securitykey/a/example.com".to_string(),
            facet: "http://example.com".to_string(),
            key_handle: websafe_encode(b"mykeyhandle"),
            check_only: false,
            channel_id_public_key: Some(jwk()),
        };
        let body = authenticate_request_body(&req).unwrap();
        assert_eq!(
            body.body,
            hex!(
                // challenge parameter: SHA-256 of the clientData JSON
                "ccd6ee2e47baef244d49a222db496bad0ef5b6f93aa7cc4d30c4821b3b9dbc57"
                // application parameter: SHA-256 of the app id
                "4b0be934baebb5d12d26011b69227fa5e86df94e7d94aa2949a89f2d493992ca"
                // key handle length, then the raw key handle
                "0b"
                "6d796b657968616e646c65"
            )
        );
        assert_eq!(compute_sha256(&body.client_data), body.body[..32]);
    }

    #[test]
    fn register_body_layout() {
        let req = RegisterRequest {
            challenge: "vqrS6WXDe1JUs5_c3i4-LkKIHRr-3XVb3azuA5TifHo".to_string(),
            app_id: "http://example.com".to_string(),
            facet: "http://example.com".to_string(),
            channel_id_public_key: Some(jwk()),
        };
        let body = register_request_body(&req).unwrap();
        assert_eq!(
            body.body,
            hex!(
                "4142d21c00d94ffb9d504ada8f99b721f4b191ae4e37ca0140f696b6983cfacb"
                "f0e6a6a97042a4f1f1c87f5f7d44315b2d852c2df5c7991cc66241bf7072d1c4"
            )
        );
        assert_eq!(compute_sha256(&body.client_data), body.body[..32]);
    }

    #[test]
    fn authenticate_rejects_malformed_key_handle() {
        let req = AuthenticateRequest {
            key_handle: "not!base64".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            authenticate_request_body(&req),
            Err(Error::Base64(_))
        ));
    }

    #[test]
    fn authenticate_rejects_oversized_key_handle() {
        let req = AuthenticateRequest {
            key_handle: websafe_encode(&[0u8; 256]),
            ..Default::default()
        };
        assert_eq!(
            authenticate_request_body(&req).unwrap_err(),
            Error::KeyHandleTooLarge
        );
    }
}
