//! ONNX Runtime encoder-decoder backend (feature-gated behind `ort`).
//!
//! Expects the two-graph export without past key values: the encoder takes
//! `input_ids` and `attention_mask`, the decoder takes `input_ids`,
//! `encoder_hidden_states` and `encoder_attention_mask` and returns `logits`
//! of shape `[1, L, vocab]`.

use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use tandem_core::TokenId;
use tracing::{debug, info};

use crate::errors::{InferenceError, Result, ResultExt};
use crate::model::ModelPaths;
use crate::traits::SequenceModel;

/// Translation model backed by two ONNX sessions.
///
/// `Session::run` needs `&mut self`, so each session sits behind a mutex.
pub struct OnnxSequenceModel {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
}

impl OnnxSequenceModel {
    /// Load the encoder and decoder graphs.
    pub fn load(paths: &ModelPaths, intra_threads: usize) -> Result<Self> {
        paths.ensure_present()?;
        info!(
            encoder = %paths.encoder.display(),
            decoder = %paths.decoder.display(),
            "loading translation model"
        );

        let encoder = build_session(&paths.encoder, intra_threads, "encoder")?;
        debug!("loaded encoder");
        let decoder = build_session(&paths.decoder, intra_threads, "decoder")?;
        debug!("loaded decoder");

        Ok(Self {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
        })
    }
}

/// Create a session for one graph with the shared runtime options.
pub(crate) fn build_session(
    path: &std::path::Path,
    intra_threads: usize,
    what: &str,
) -> Result<Session> {
    Session::builder()
        .inference("session builder")?
        .with_intra_threads(intra_threads.max(1))
        .inference("set threads")?
        .with_log_level(ort::logging::LogLevel::Warning)
        .inference("log level")?
        .commit_from_file(path)
        .model(&format!("load {what}"))
}

/// Row-major `[1, n]` tensor from token ids.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn id_tensor(ids: &[i64], what: &str) -> Result<Tensor<i64>> {
    Tensor::from_array(([1i64, ids.len() as i64], ids.to_vec())).inference(what)
}

/// Squeeze a `[1, rows, cols]` output to `[rows, cols]`.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub(crate) fn squeeze_batch(shape: &[i64], data: &[f32], what: &str) -> Result<Array2<f32>> {
    if shape.len() != 3 || shape[0] != 1 {
        return Err(InferenceError::Shape(format!("{what}: {shape:?}")));
    }
    let rows = shape[1] as usize;
    let cols = shape[2] as usize;
    Array2::from_shape_vec((rows, cols), data.to_vec())
        .map_err(|e| InferenceError::Shape(format!("{what}: {e}")))
}

impl SequenceModel for OnnxSequenceModel {
    fn encode(&self, input_ids: &[TokenId], attention_mask: &[i64]) -> Result<Array2<f32>> {
        let ids = id_tensor(input_ids, "encoder input_ids tensor")?;
        let mask = id_tensor(attention_mask, "encoder attention_mask tensor")?;

        let mut encoder = self.encoder.lock();
        let outputs = encoder
            .run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask,
            ])
            .inference("encoder run")?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .inference("extract encoder output")?;
        squeeze_batch(shape, data, "encoder output")
    }

    fn decode(
        &self,
        input_ids: &[TokenId],
        encoder_hidden_states: &Array2<f32>,
        encoder_attention_mask: &[i64],
    ) -> Result<Array2<f32>> {
        let ids = id_tensor(input_ids, "decoder input_ids tensor")?;
        let mask = id_tensor(encoder_attention_mask, "encoder_attention_mask tensor")?;
        let (src_len, hidden) = encoder_hidden_states.dim();
        let flat: Vec<f32> = encoder_hidden_states.iter().copied().collect();
        #[allow(clippy::cast_possible_wrap)]
        let states = Tensor::from_array(([1i64, src_len as i64, hidden as i64], flat))
            .inference("encoder_hidden_states tensor")?;

        let mut decoder = self.decoder.lock();
        let outputs = decoder
            .run(ort::inputs![
                "input_ids" => ids,
                "encoder_hidden_states" => states,
                "encoder_attention_mask" => mask,
            ])
            .inference("decoder run")?;

        let (shape, data) = outputs["logits"]
            .try_extract_tensor::<f32>()
            .inference("extract logits")?;
        squeeze_batch(shape, data, "decoder logits")
    }
}
