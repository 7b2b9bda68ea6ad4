//! Alignment error types.

use tandem_inference::InferenceError;
use thiserror::Error;

/// Errors raised while aligning a sentence pair.
#[derive(Debug, Error)]
pub enum AlignmentError {
    /// The embedding provider returned a matrix that does not match its input.
    #[error("embedding shape mismatch: {0}")]
    Shape(String),

    /// Tokenizer or embedding model failure.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Result alias for alignment operations.
pub type Result<T> = std::result::Result<T, AlignmentError>;
