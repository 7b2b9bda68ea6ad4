//! Protocol error types.

use thiserror::Error;

/// Errors raised at the protocol boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The line is not valid JSON (or not UTF-8).
    #[error("{0}")]
    Malformed(String),

    /// The line is JSON but not an object.
    #[error("request must be a JSON object")]
    NotAnObject,

    /// A field has the wrong type.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// `command` names nothing the server knows.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Response serialization failed.
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    /// Reading requests or writing responses failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
