//! Model file layout and `config.json` parsing.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tandem_core::{SpecialTokens, TokenId};
use tracing::debug;

use crate::errors::{InferenceError, Result};

/// Resolved file locations of the translation model.
#[derive(Clone, Debug)]
pub struct ModelPaths {
    /// Encoder ONNX file.
    pub encoder: PathBuf,
    /// Decoder ONNX file (no past key values).
    pub decoder: PathBuf,
    /// Hugging Face model `config.json`.
    pub config: PathBuf,
    /// Translation `tokenizer.json`.
    pub tokenizer: PathBuf,
}

impl ModelPaths {
    /// Build paths from the model and tokenizer directories.
    pub fn new(
        model_dir: impl AsRef<Path>,
        tokenizer_dir: impl AsRef<Path>,
        encoder_file: &str,
        decoder_file: &str,
    ) -> Self {
        let model_dir = model_dir.as_ref();
        let tokenizer_dir = tokenizer_dir.as_ref();
        Self {
            encoder: model_dir.join(encoder_file),
            decoder: model_dir.join(decoder_file),
            // config.json ships with the tokenizer export, fall back to model_dir
            config: first_existing(&[
                tokenizer_dir.join("config.json"),
                model_dir.join("config.json"),
            ]),
            tokenizer: tokenizer_dir.join("tokenizer.json"),
        }
    }

    /// Fail with the first required file that is missing.
    pub fn ensure_present(&self) -> Result<()> {
        for (what, path) in [
            ("encoder", &self.encoder),
            ("decoder", &self.decoder),
            ("tokenizer", &self.tokenizer),
        ] {
            if !path.exists() {
                return Err(InferenceError::ModelNotAvailable(format!(
                    "{what} not found at {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Resolved file locations of the alignment model.
#[derive(Clone, Debug)]
pub struct AlignerPaths {
    /// Embedding ONNX file.
    pub model: PathBuf,
    /// Local `tokenizer.json`, if the directory ships one.
    pub tokenizer: Option<PathBuf>,
}

impl AlignerPaths {
    /// Resolve the aligner files inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>, model_file: &str) -> Self {
        let dir = dir.as_ref();
        let tokenizer = dir.join("tokenizer.json");
        Self {
            model: dir.join(model_file),
            tokenizer: tokenizer.exists().then_some(tokenizer),
        }
    }
}

/// Subset of a Hugging Face seq2seq `config.json` the decoder needs.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Decoder start token (`</s>` for NLLB).
    pub decoder_start_token_id: Option<TokenId>,
    /// End of sequence token.
    pub eos_token_id: Option<TokenId>,
    /// Padding token.
    pub pad_token_id: Option<TokenId>,
    /// Vocabulary size, if declared.
    pub vocab_size: Option<usize>,
}

impl ModelConfig {
    /// Read `config.json`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(?path, "model config not found, using NLLB special tokens");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Special tokens declared by the config, NLLB defaults otherwise.
    pub fn special_tokens(&self) -> SpecialTokens {
        let defaults = SpecialTokens::default();
        SpecialTokens {
            bos: self.decoder_start_token_id.unwrap_or(defaults.bos),
            eos: self.eos_token_id.unwrap_or(defaults.eos),
            pad: self.pad_token_id.unwrap_or(defaults.pad),
        }
    }
}

fn first_existing(candidates: &[PathBuf]) -> PathBuf {
    candidates
        .iter()
        .find(|p| p.exists())
        .unwrap_or(&candidates[0])
        .clone()
}
