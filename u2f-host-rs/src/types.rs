//! Caller-facing request and response types.
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// An elliptic-curve public key in JSON Web Key form, bound into
/// `clientData` for TLS channel id binding.
///
/// Key order is significant on the wire; the declaration order here is the
/// serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JSONWebKey {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
}

/// The `cid_pubkey` value bound into `clientData`.
///
/// The three request inputs this can be built from are mutually exclusive;
/// [ChannelIdPublicKey::from_options] validates the combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelIdPublicKey {
    /// The client does not support channel id binding; serializes as the
    /// string `"unused"`.
    Unused,
    /// A structured key, serialized as a JSON object.
    Key(JSONWebKey),
    /// A pre-serialized key, passed through as a JSON string.
    KeyString(String),
}

impl ChannelIdPublicKey {
    /// Combines the three channel-id request options into at most one
    /// value, failing with [Error::AmbiguousChannelId] when more than one
    /// is set.
    pub fn from_options(
        jwk: Option<JSONWebKey>,
        jwk_string: Option<String>,
        unused: bool,
    ) -> Result<Option<Self>> {
        match (jwk, jwk_string, unused) {
            (None, None, false) => Ok(None),
            (None, None, true) => Ok(Some(Self::Unused)),
            (Some(jwk), None, false) => Ok(Some(Self::Key(jwk))),
            (None, Some(s), false) => Ok(Some(Self::KeyString(s))),
            _ => Err(Error::AmbiguousChannelId),
        }
    }
}

impl Serialize for ChannelIdPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ChannelIdPublicKey::Unused => serializer.serialize_str("unused"),
            ChannelIdPublicKey::Key(jwk) => jwk.serialize(serializer),
            ChannelIdPublicKey::KeyString(s) => serializer.serialize_str(s),
        }
    }
}

/// A request to register a key against an application id.
#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    /// The registration challenge, passed into `clientData` verbatim.
    pub challenge: String,
    /// The application id the new key pair will be bound to.
    pub app_id: String,
    /// The origin requesting the registration, recorded in `clientData`.
    pub facet: String,
    /// Channel id public key to bind into `clientData`, if any.
    pub channel_id_public_key: Option<ChannelIdPublicKey>,
}

/// A successful registration. All binary fields are URL-safe, non-padded
/// Base64 of the device's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub registration_data: String,
    pub client_data: String,
}

/// A request to sign a challenge with a previously registered key handle.
#[derive(Debug, Clone, Default)]
pub struct AuthenticateRequest {
    /// The challenge to sign, passed into `clientData` verbatim.
    pub challenge: String,
    /// The application id the key handle was registered against.
    pub app_id: String,
    /// The origin requesting the assertion, recorded in `clientData`.
    pub facet: String,
    /// The key handle from registration, URL-safe Base64 encoded.
    pub key_handle: String,
    /// When set, only ask the device whether the key handle is valid: the
    /// device answers [Error::TestOfUserPresenceRequired] for a valid
    /// handle and [Error::BadKeyHandle] for an unknown one, without
    /// signing.
    ///
    /// [Error::TestOfUserPresenceRequired]: crate::Error::TestOfUserPresenceRequired
    /// [Error::BadKeyHandle]: crate::Error::BadKeyHandle
    pub check_only: bool,
    /// Channel id public key to bind into `clientData`, if any.
    pub channel_id_public_key: Option<ChannelIdPublicKey>,
}

/// A successful assertion. `key_handle` echoes the request's original
/// string; the other fields are URL-safe, non-padded Base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    pub key_handle: String,
    pub client_data: String,
    pub signature_data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwk() -> JSONWebKey {
        JSONWebKey {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x: "HzQwlfXX7Q4S5MtCCnZUNBw3RMzPO9tOyWjBqRl4tJ8".to_string(),
            y: "XVguGFLIZx1fXg3wNqfdbn75hi4-_7-BxhMljw42Ht4".to_string(),
        }
    }

    #[test]
    fn channel_id_from_options() {
        assert_eq!(ChannelIdPublicKey::from_options(None, None, false), Ok(None));
        assert_eq!(
            ChannelIdPublicKey::from_options(None, None, true),
            Ok(Some(ChannelIdPublicKey::Unused))
        );
        assert_eq!(
            ChannelIdPublicKey::from_options(Some(jwk()), None, false),
            Ok(Some(ChannelIdPublicKey::Key(jwk())))
        );
        assert_eq!(
            ChannelIdPublicKey::from_options(None, Some("k".to_string()), false),
            Ok(Some(ChannelIdPublicKey::KeyString("k".to_string())))
        );
    }

    #[test]
    fn channel_id_options_are_mutually_exclusive() {
        assert_eq!(
            ChannelIdPublicKey::from_options(Some(jwk()), Some("k".to_string()), false),
            Err(Error::AmbiguousChannelId)
        );
        assert_eq!(
            ChannelIdPublicKey::from_options(Some(jwk()), None, true),
            Err(Error::AmbiguousChannelId)
        );
        assert_eq!(
            ChannelIdPublicKey::from_options(None, Some("k".to_string()), true),
            Err(Error::AmbiguousChannelId)
        );
    }

    #[test]
    fn jwk_serializes_in_declaration_order() {
        assert_eq!(
            serde_json::to_string(&jwk()).unwrap(),
            "{\"kty\":\"EC\",\"crv\":\"P-256\",\
             \"x\":\"HzQwlfXX7Q4S5MtCCnZUNBw3RMzPO9tOyWjBqRl4tJ8\",\
             \"y\":\"XVguGFLIZx1fXg3wNqfdbn75hi4-_7-BxhMljw42Ht4\"}"
        );
    }

    #[test]
    fn response_json_field_names() {
        let resp = AuthenticateResponse {
            key_handle: "kh".to_string(),
            client_data: "cd".to_string(),
            signature_data: "sig".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            "{\"keyHandle\":\"kh\",\"clientData\":\"cd\",\"signatureData\":\"sig\"}"
        );
    }
}
