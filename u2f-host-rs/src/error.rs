use thiserror::Error;
use u2f_hid_rs::HidError;

use crate::usb::responses::U2FError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while driving a U2F key.
///
/// A status error ([Error::TestOfUserPresenceRequired],
/// [Error::BadKeyHandle], [Error::Status]) ends the current exchange but
/// leaves the session healthy; polling callers branch on the first two to
/// tell "touch the key and ask again" from "this key handle belongs to a
/// different key".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A field that should have been URL-safe Base64 could not be decoded.
    #[error("invalid base64url data: {0}")]
    Base64(String),
    /// More than one of the mutually-exclusive channel id public key
    /// options was supplied.
    #[error("mutually exclusive channel id public key options were supplied")]
    AmbiguousChannelId,
    /// The key handle cannot be length-prefixed in a single byte.
    #[error("key handle longer than 255 bytes")]
    KeyHandleTooLarge,
    #[error("could not serialize client data: {0}")]
    Json(String),

    /// A command was issued on a session that has not completed its channel
    /// handshake.
    #[error("device session is not open")]
    Closed,
    /// The payload does not fit in a single U2FHID transaction.
    #[error("message too large for the U2FHID transport")]
    MessageTooLarge,
    /// A continuation frame arrived for a different channel.
    #[error("response frame carried an unexpected channel id")]
    UnexpectedChannel,
    /// A continuation frame arrived out of order.
    #[error("response frame carried an unexpected sequence number")]
    UnexpectedSequence,
    /// The device reported a transport-level error frame.
    #[error("U2FHID transport error: {0:?}")]
    Transport(U2FError),
    /// The device sent a response too short to parse.
    #[error("device sent a malformed response")]
    InvalidResponse,

    /// The device requires a test of user presence; retry after the user
    /// touches the key.
    #[error("test of user presence required")]
    TestOfUserPresenceRequired,
    /// The supplied key handle was not issued by this device.
    #[error("key handle is not valid for this device")]
    BadKeyHandle,
    /// Any other non-success status word from the device.
    #[error("device returned error status 0x{0:04x}")]
    Status(u16),

    #[error("HID error: {0}")]
    Hid(#[from] HidError),
    #[error("OpenSSL error: {0}")]
    OpenSSL(String),
}

impl From<openssl::error::ErrorStack> for Error {
    fn from(v: openssl::error::ErrorStack) -> Self {
        Self::OpenSSL(v.to_string())
    }
}
