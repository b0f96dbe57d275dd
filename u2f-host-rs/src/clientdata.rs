//! The `clientData` object a key's signature commits to.
//!
//! The device signs `SHA-256(clientDataJSON)` and the relying party
//! re-hashes the same bytes, so serialization must be byte-for-byte
//! deterministic: keys in declaration order, no insignificant whitespace,
//! and `cid_pubkey` omitted entirely when no channel-id input was given.
//! serde_json writes struct fields in declaration order, which is why this
//! is a fixed struct and not a map.
use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::ChannelIdPublicKey;

/// `typ` value for registration.
pub const CLIENT_DATA_TYPE_REGISTER: &str = "navigator.id.finishEnrollment";
/// `typ` value for authentication.
pub const CLIENT_DATA_TYPE_AUTHENTICATE: &str = "navigator.id.getAssertion";

#[derive(Debug, Serialize)]
pub struct ClientData<'a> {
    pub typ: &'a str,
    pub challenge: &'a str,
    #[serde(rename = "cid_pubkey", skip_serializing_if = "Option::is_none")]
    pub cid_pubkey: Option<&'a ChannelIdPublicKey>,
    pub origin: &'a str,
}

impl ClientData<'_> {
    /// Serializes to the exact bytes hashed into the challenge parameter.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Json(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JSONWebKey;
    use crate::util::compute_sha256;

    fn jwk() -> ChannelIdPublicKey {
        ChannelIdPublicKey::Key(JSONWebKey {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x: "HzQwlfXX7Q4S5MtCCnZUNBw3RMzPO9tOyWjBqRl4tJ8".to_string(),
            y: "XVguGFLIZx1fXg3wNqfdbn75hi4-_7-BxhMljw42Ht4".to_string(),
        })
    }

    #[test]
    fn assertion_client_data_bytes_and_digest() {
        let cid = jwk();
        let client_data = ClientData {
            typ: CLIENT_DATA_TYPE_AUTHENTICATE,
            challenge: "opsXqUifDriAAmWclinfbS0e-USY0CgyJHe_Otd7z8o",
            cid_pubkey: Some(&cid),
            origin: "http://example.com",
        }
        .to_bytes()
        .unwrap();

        assert_eq!(
            client_data,
            br#"{"typ":"navigator.id.getAssertion","challenge":"opsXqUifDriAAmWclinfbS0e-USY0CgyJHe_Otd7z8o","cid_pubkey":{"kty":"EC","crv":"P-256","x":"HzQwlfXX7Q4S5MtCCnZUNBw3RMzPO9tOyWjBqRl4tJ8","y":"XVguGFLIZx1fXg3wNqfdbn75hi4-_7-BxhMljw42Ht4"},"origin":"http://example.com"}"#
        );
        assert_eq!(
            hex::encode(compute_sha256(&client_data)),
            "ccd6ee2e47baef244d49a222db496bad0ef5b6f93aa7cc4d30c4821b3b9dbc57"
        );
    }

    #[test]
    fn cid_pubkey_is_omitted_when_absent() {
        let client_data = ClientData {
            typ: CLIENT_DATA_TYPE_REGISTER,
            challenge: "abc",
            cid_pubkey: None,
            origin: "https://example.com",
        }
        .to_bytes()
        .unwrap();
        assert_eq!(
            client_data,
            br#"{"typ":"navigator.id.finishEnrollment","challenge":"abc","origin":"https://example.com"}"#
        );
    }

    #[test]
    fn unused_channel_id_serializes_as_string() {
        let cid = ChannelIdPublicKey::Unused;
        let client_data = ClientData {
            typ: CLIENT_DATA_TYPE_AUTHENTICATE,
            challenge: "abc",
            cid_pubkey: Some(&cid),
            origin: "https://example.com",
        }
        .to_bytes()
        .unwrap();
        assert_eq!(
            client_data,
            br#"{"typ":"navigator.id.getAssertion","challenge":"abc","cid_pubkey":"unused","origin":"https://example.com"}"#
        );
    }

    #[test]
    fn serialization_is_stable_across_runs() {
        let cid = jwk();
        let build = || {
            ClientData {
                typ: CLIENT_DATA_TYPE_AUTHENTICATE,
                challenge: "c",
                cid_pubkey: Some(&cid),
                origin: "o",
            }
            .to_bytes()
            .unwrap()
        };
        assert_eq!(build(), build());
    }
}
