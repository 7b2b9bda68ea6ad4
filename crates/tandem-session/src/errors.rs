//! Session error types.

use tandem_align::AlignmentError;
use tandem_decoding::DecodingError;
use tandem_inference::InferenceError;
use thiserror::Error;

/// Failure of a single translation request.
///
/// Every variant is request-scoped; the session stays usable afterwards.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The translation tokenizer has no token for a resolved language code.
    #[error("language code not in tokenizer vocabulary: {0}")]
    UnknownLanguageCode(String),

    /// Tokenization or detokenization failed.
    #[error(transparent)]
    Tokenizer(#[from] InferenceError),

    /// Generation failed.
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// Alignment failed.
    #[error(transparent)]
    Alignment(#[from] AlignmentError),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = SessionError::UnknownLanguageCode("xxx_Latn".into());
        assert_eq!(
            err.to_string(),
            "language code not in tokenizer vocabulary: xxx_Latn"
        );

        let err: SessionError = DecodingError::InvalidConfig("beam_size must be at least 1".into()).into();
        assert_eq!(
            err.to_string(),
            "invalid generation config: beam_size must be at least 1"
        );
    }
}
