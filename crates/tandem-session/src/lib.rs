//! # tandem-session
//!
//! One process-wide [`TranslationSession`] composes the decoding engine, the
//! optional alignment engine and the language table into a single
//! `translate_and_align` operation. It also owns the live generation config
//! that `update_settings` mutates between requests.

#![deny(unsafe_code)]

pub mod errors;
pub mod languages;
pub mod session;

pub use errors::{Result, SessionError};
pub use languages::{LANGUAGE_CODES, LanguageTable};
pub use session::{Translation, TranslationSession};
