//! ISO 7816-style APDU envelope for U2F raw messages.
//!
//! Requests use the short encoding, except that the request length is
//! always three big-endian bytes regardless of magnitude. This deviation
//! from strict ISO 7816 keeps parsing uniform on the device and is part of
//! the wire contract.
use crate::error::{Error, Result};

// U2F raw message instructions.
pub(crate) const INS_REGISTER: u8 = 0x01;
pub(crate) const INS_AUTHENTICATE: u8 = 0x02;
pub(crate) const INS_VERSION: u8 = 0x03;

// Control byte (P1) values for authentication.
pub(crate) const P1_REQUEST_USER_PRESENCE: u8 = 0x03;
pub(crate) const P1_CHECK_ONLY: u8 = 0x07;

// Status words.
pub(crate) const SW_NO_ERROR: u16 = 0x9000;
pub(crate) const SW_CONDITIONS_NOT_SATISFIED: u16 = 0x6985;
pub(crate) const SW_WRONG_DATA: u16 = 0x6a80;

/// Builds a command APDU: class `0x00`, instruction, parameters, a 3-byte
/// big-endian request length, the request data, and an Le trailer.
pub(crate) fn encode_request(ins: u8, p1: u8, p2: u8, data: &[u8]) -> Vec<u8> {
    let mut apdu = Vec::with_capacity(9 + data.len());
    apdu.extend_from_slice(&[0x00, ins, p1, p2]);
    apdu.extend_from_slice(&(data.len() as u32).to_be_bytes()[1..]);
    apdu.extend_from_slice(data);
    apdu.extend_from_slice(&[0x04, 0x00]);
    apdu
}

/// A response APDU: the reply's trailing two bytes are the status word,
/// everything before them is response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseApdu {
    pub status: u16,
    pub data: Vec<u8>,
}

impl TryFrom<&[u8]> for ResponseApdu {
    type Error = Error;

    fn try_from(b: &[u8]) -> Result<Self> {
        if b.len() < 2 {
            return Err(Error::InvalidResponse);
        }
        let (data, sw) = b.split_at(b.len() - 2);
        Ok(ResponseApdu {
            status: u16::from_be_bytes([sw[0], sw[1]]),
            data: data.to_vec(),
        })
    }
}

impl ResponseApdu {
    pub fn is_ok(&self) -> bool {
        self.status == SW_NO_ERROR
    }

    /// Extracts the response data, mapping non-success status words to
    /// typed errors.
    pub fn into_result(self) -> Result<Vec<u8>> {
        match self.status {
            SW_NO_ERROR => Ok(self.data),
            SW_CONDITIONS_NOT_SATISFIED => Err(Error::TestOfUserPresenceRequired),
            SW_WRONG_DATA => Err(Error::BadKeyHandle),
            status => Err(Error::Status(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn encode_short_request() {
        assert_eq!(
            encode_request(INS_VERSION, 0, 0, &[0x01, 0x02, 0x03]),
            hex!("00 03 00 00 000003 010203 0400")
        );
    }

    #[test]
    fn encode_empty_request() {
        assert_eq!(encode_request(INS_VERSION, 0, 0, &[]), hex!("00 03 00 00 000000 0400"));
    }

    #[test]
    fn encode_length_is_three_bytes_big_endian() {
        let apdu = encode_request(INS_AUTHENTICATE, P1_REQUEST_USER_PRESENCE, 0, &[0u8; 300]);
        assert_eq!(&apdu[..7], hex!("00 02 03 00 00012c"));
        assert_eq!(apdu.len(), 9 + 300);
        assert_eq!(&apdu[apdu.len() - 2..], hex!("0400"));
    }

    #[test]
    fn response_splits_trailing_status_word() {
        let resp = ResponseApdu::try_from(&b"U2F_V2\x90\x00"[..]).unwrap();
        assert_eq!(resp.status, SW_NO_ERROR);
        assert_eq!(resp.data, b"U2F_V2");
        assert!(resp.is_ok());
        assert_eq!(resp.into_result().unwrap(), b"U2F_V2");
    }

    #[test]
    fn response_too_short() {
        assert_eq!(ResponseApdu::try_from(&[0x90u8][..]), Err(Error::InvalidResponse));
    }

    #[test]
    fn status_words_map_to_typed_errors() {
        let apdu = |status: u16| ResponseApdu {
            status,
            data: vec![],
        };
        assert_eq!(
            apdu(0x6985).into_result(),
            Err(Error::TestOfUserPresenceRequired)
        );
        assert_eq!(apdu(0x6a80).into_result(), Err(Error::BadKeyHandle));
        assert_eq!(apdu(0x6d00).into_result(), Err(Error::Status(0x6d00)));
    }

    #[test]
    fn generic_status_error_names_the_code() {
        assert!(Error::Status(0x6d00).to_string().contains("0x6d00"));
    }
}
