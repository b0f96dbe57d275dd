use std::io::ErrorKind;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HidError>;

#[derive(Debug, Error, PartialEq, Eq, PartialOrd, Ord)]
pub enum HidError {
    #[error("I/O error communicating with device: {0}")]
    IoError(String),
    #[error("attempted to communicate with a closed device")]
    Closed,
    #[error("could not send report to device")]
    SendError,
    #[error("timed out waiting for a report from the device")]
    Timeout,
    #[error("device sent a report of unexpected length")]
    InvalidMessageLength,
    #[error("permission denied")]
    PermissionDenied,
}

impl From<hidapi::HidError> for HidError {
    fn from(v: hidapi::HidError) -> Self {
        match v {
            hidapi::HidError::IoError { error } => error.into(),
            v => Self::IoError(v.to_string()),
        }
    }
}

impl From<std::io::Error> for HidError {
    fn from(v: std::io::Error) -> Self {
        match v.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::IoError(v.to_string()),
        }
    }
}
