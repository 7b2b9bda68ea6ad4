//! Decoding error types.

use tandem_inference::InferenceError;
use thiserror::Error;

/// Errors raised while generating a token sequence.
#[derive(Debug, Error)]
pub enum DecodingError {
    /// Generation parameters the loop cannot run with.
    #[error("invalid generation config: {0}")]
    InvalidConfig(String),

    /// Source ids and attention mask disagree.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The decoder returned fewer rows than the sequence needs.
    #[error("decoder returned {rows} rows, needed row {position}")]
    MissingRow {
        /// Rows in the logits matrix.
        rows: usize,
        /// Row that was requested.
        position: usize,
    },

    /// The sequence model failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Result alias for decoding operations.
pub type Result<T> = std::result::Result<T, DecodingError>;
