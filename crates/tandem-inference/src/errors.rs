//! Inference error types.

use thiserror::Error;

/// Errors raised by model and tokenizer collaborators.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Model files missing or failed to load.
    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    /// Tokenizer missing, failed to load, or failed to encode/decode.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// ONNX Runtime session creation or inference failure.
    #[error("inference error: {0}")]
    Inference(String),

    /// A model returned a tensor with an unexpected shape.
    #[error("unexpected output shape: {0}")]
    Shape(String),

    /// I/O error (file read).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed model `config.json`.
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Extension trait for mapping foreign errors into [`InferenceError`].
pub trait ResultExt<T> {
    /// Wrap the error as [`InferenceError::Inference`] with `context` prefix.
    fn inference(self, context: &str) -> Result<T>;
    /// Wrap the error as [`InferenceError::ModelNotAvailable`] with `context` prefix.
    fn model(self, context: &str) -> Result<T>;
    /// Wrap the error as [`InferenceError::Tokenizer`] with `context` prefix.
    fn tokenizer(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn inference(self, context: &str) -> Result<T> {
        self.map_err(|e| InferenceError::Inference(format!("{context}: {e}")))
    }
    fn model(self, context: &str) -> Result<T> {
        self.map_err(|e| InferenceError::ModelNotAvailable(format!("{context}: {e}")))
    }
    fn tokenizer(self, context: &str) -> Result<T> {
        self.map_err(|e| InferenceError::Tokenizer(format!("{context}: {e}")))
    }
}
