//! # tandem-core
//!
//! Foundation types shared by every tandem crate.
//!
//! - **Tokens**: [`TokenId`] and the special-token triple used by the decoder
//! - **Alignment links**: [`AlignmentLink`] pairs of whole-word indices
//! - **Logging**: stderr-only `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod alignment;
pub mod logging;
pub mod tokens;

pub use alignment::{AlignmentLink, sorted_links};
pub use tokens::{SpecialTokens, TokenId};
