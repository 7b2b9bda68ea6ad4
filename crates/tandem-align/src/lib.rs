//! # tandem-align
//!
//! Word alignment between a sentence and its translation.
//!
//! Each side is split into subwords, embedded in context, stripped of its
//! boundary markers and row-normalized. A source subword and a target
//! subword are linked only when each is the other's best match in the
//! cosine similarity matrix. Subword links are then lifted to whole-word
//! links through each side's word map.

#![deny(unsafe_code)]

pub mod engine;
pub mod errors;
pub mod normalize;
pub mod similarity;
pub mod word_map;

pub use engine::AlignmentEngine;
pub use errors::{AlignmentError, Result};
pub use word_map::WordPieces;
