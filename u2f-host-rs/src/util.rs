use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use openssl::sha;

use crate::error::{Error, Result};

/// SHA-256 digest of `data`.
pub fn compute_sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = sha::Sha256::new();
    hasher.update(data);
    hasher.finish()
}

/// Encodes bytes as URL-safe, non-padded Base64 (RFC 4648 §5).
pub fn websafe_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decodes URL-safe, non-padded Base64.
pub fn websafe_decode(data: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|e| Error::Base64(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn websafe_round_trip() {
        for data in [
            &b""[..],
            &b"f"[..],
            &b"fo"[..],
            &b"foo"[..],
            &hex!("fbff fe00 01")[..],
        ] {
            assert_eq!(websafe_decode(&websafe_encode(data)).unwrap(), data);
        }
    }

    #[test]
    fn websafe_encode_is_unpadded_and_url_safe() {
        assert_eq!(websafe_encode(&hex!("fbff")), "-_8");
        assert_eq!(websafe_encode(b"mykeyhandle"), "bXlrZXloYW5kbGU");
    }

    #[test]
    fn websafe_decode_rejects_malformed_input() {
        assert!(matches!(websafe_decode("a!bc"), Err(Error::Base64(_))));
        // Standard-alphabet and padded forms are not websafe.
        assert!(websafe_decode("+/==").is_err());
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            hex::encode(compute_sha256(b"http://example.com")),
            "f0e6a6a97042a4f1f1c87f5f7d44315b2d852c2df5c7991cc66241bf7072d1c4"
        );
    }
}
