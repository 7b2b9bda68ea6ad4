//! # tandem-decoding
//!
//! Drives a [`SequenceModel`](tandem_inference::SequenceModel) token by token.
//!
//! The encoder runs once per request. Each step pads every live hypothesis to
//! the working length, reads the logits row of its last real token, applies
//! repetition control and extends the beam. A beam width of 1 is greedy
//! decoding.

#![deny(unsafe_code)]

pub mod beam;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logits;
pub mod repetition;

pub use config::{GenerationConfig, GenerationUpdate};
pub use engine::DecodingEngine;
pub use errors::{DecodingError, Result};
