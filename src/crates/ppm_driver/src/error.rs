use std::io;

use serde_json::Value;
use thiserror::Error;

use crate::model::RequestId;

/// Result alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised while turning models into wire JSON and back.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` should be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("physics options carry neither `Velocity` nor `Destination`")]
    UnknownVariant,
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while talking to the object server.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("bad handshake: expected \"PpM\", received {received:?}")]
    Handshake { received: Vec<u8> },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed response: {0}")]
    ProtocolParse(String),
    #[error("server rejected request {id:?}: {error}")]
    Server {
        id: Option<RequestId>,
        error: Value,
    },
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),
    #[error("server closed the connection")]
    ConnectionClosed,
    #[error("driver interrupted")]
    Interrupted,
}

impl DriverError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        DriverError::ProtocolParse(message.into())
    }

    /// Process exit status the binary reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            DriverError::Handshake { .. } => 2,
            DriverError::Interrupted | DriverError::ConnectionClosed => 0,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_failures_exit_with_status_two() {
        let err = DriverError::Handshake {
            received: b"XYZ".to_vec(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(DriverError::protocol("bad").exit_code(), 1);
        assert_eq!(DriverError::Interrupted.exit_code(), 0);
        assert_eq!(DriverError::ConnectionClosed.exit_code(), 0);
    }
}
