//! # tandem-inference
//!
//! Narrow interfaces to the neural collaborators the bridge drives, plus
//! their implementations.
//!
//! - [`SequenceModel`]: encoder once per request, decoder once per step
//! - [`EmbeddingProvider`]: contextual subword vectors for alignment
//! - [`TranslationTokenizer`] / [`SubwordTokenizer`]: text ↔ token ids
//!
//! The `ort` feature adds ONNX Runtime backends (`OnnxSequenceModel`,
//! `OnnxEmbeddingProvider`) and `tokenizers`-backed tokenizers. The
//! [`mock`] module holds deterministic stand-ins used throughout the tests.

#![deny(unsafe_code)]

pub mod errors;
pub mod mock;
pub mod model;
pub mod traits;

#[cfg(feature = "ort")]
pub mod hf_tokenizer;
#[cfg(feature = "ort")]
pub mod ort_embedding;
#[cfg(feature = "ort")]
pub mod ort_seq2seq;

pub use errors::{InferenceError, Result, ResultExt};
pub use model::{AlignerPaths, ModelConfig, ModelPaths};
pub use traits::{EmbeddingProvider, SequenceModel, SubwordTokenizer, TranslationTokenizer};

#[cfg(feature = "ort")]
pub use hf_tokenizer::{HfSubwordTokenizer, HfTranslationTokenizer};
#[cfg(feature = "ort")]
pub use ort_embedding::OnnxEmbeddingProvider;
#[cfg(feature = "ort")]
pub use ort_seq2seq::OnnxSequenceModel;
