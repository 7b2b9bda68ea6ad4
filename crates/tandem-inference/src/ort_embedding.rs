//! ONNX Runtime contextual embedding backend (feature-gated behind `ort`).
//!
//! The graph takes `input_ids` and `attention_mask`; output 0 is the last
//! hidden layer `[1, L, dim]`.

use std::path::Path;

use ndarray::Array2;
use ort::session::Session;
use parking_lot::Mutex;
use tandem_core::TokenId;
use tracing::info;

use crate::errors::{InferenceError, Result, ResultExt};
use crate::ort_seq2seq::{build_session, id_tensor, squeeze_batch};
use crate::traits::EmbeddingProvider;

/// BERT-style encoder returning the last hidden layer per token.
pub struct OnnxEmbeddingProvider {
    session: Mutex<Session>,
}

impl OnnxEmbeddingProvider {
    /// Load the embedding graph from `model`.
    pub fn load(model: &Path, intra_threads: usize) -> Result<Self> {
        if !model.exists() {
            return Err(InferenceError::ModelNotAvailable(format!(
                "aligner model not found at {}",
                model.display()
            )));
        }
        info!(model = %model.display(), "loading alignment model");
        let session = build_session(model, intra_threads, "aligner")?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl EmbeddingProvider for OnnxEmbeddingProvider {
    fn embed(&self, input_ids: &[TokenId], attention_mask: &[i64]) -> Result<Array2<f32>> {
        let ids = id_tensor(input_ids, "aligner input_ids tensor")?;
        let mask = id_tensor(attention_mask, "aligner attention_mask tensor")?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask,
            ])
            .inference("aligner run")?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .inference("extract hidden states")?;
        let hidden = squeeze_batch(shape, data, "aligner output")?;
        if hidden.nrows() != input_ids.len() {
            return Err(InferenceError::Shape(format!(
                "aligner returned {} rows for {} tokens",
                hidden.nrows(),
                input_ids.len()
            )));
        }
        Ok(hidden)
    }
}
