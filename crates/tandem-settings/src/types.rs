//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a settings
//! file may contain any subset of fields; missing fields keep their default.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the bridge process.
///
/// ```json
/// {
///   "models": { "modelDir": "/opt/nllb" },
///   "generation": { "beamSize": 1 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeSettings {
    /// Model, tokenizer and aligner locations.
    pub models: ModelSettings,
    /// Initial generation configuration.
    pub generation: GenerationSettings,
    /// Language fallback behavior.
    pub languages: LanguageSettings,
    /// Diagnostic logging.
    pub logging: LoggingSettings,
}

impl BridgeSettings {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.generation.validate()
    }
}

/// Where the translation and alignment models live.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Directory holding the encoder/decoder ONNX files and `config.json`.
    pub model_dir: String,
    /// Directory holding the translation `tokenizer.json`.
    pub tokenizer_dir: String,
    /// Directory holding the alignment model. `None` disables alignment.
    pub aligner_dir: Option<String>,
    /// Hub repository used when the aligner directory has no `tokenizer.json`.
    pub aligner_tokenizer: String,
    /// Encoder file name inside `model_dir`.
    pub encoder_file: String,
    /// Decoder file name inside `model_dir`.
    pub decoder_file: String,
    /// Aligner file name inside `aligner_dir`.
    pub aligner_file: String,
    /// Intra-op thread count for every ONNX session.
    pub intra_threads: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_dir: "assets/onnx_models".to_string(),
            tokenizer_dir: "assets/models".to_string(),
            aligner_dir: Some("assets/onnx_models/awesome_align_int8".to_string()),
            aligner_tokenizer: "bert-base-multilingual-cased".to_string(),
            encoder_file: "encoder_model.onnx".to_string(),
            decoder_file: "decoder_model.onnx".to_string(),
            aligner_file: "model.onnx".to_string(),
            intra_threads: 1,
        }
    }
}

/// Generation parameters applied at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Number of live hypotheses per step (1 = greedy).
    pub beam_size: usize,
    /// Logit penalty for already generated tokens (1.0 = none).
    pub repetition_penalty: f32,
    /// Forbidden repeated n-gram size (0 = disabled).
    pub no_repeat_ngram_size: usize,
    /// Upper bound on decoder sequence length, including the two prefix tokens.
    pub max_length: usize,
    /// Fixed length decoder input is padded to.
    pub working_length: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            beam_size: 4,
            repetition_penalty: 1.2,
            no_repeat_ngram_size: 3,
            max_length: 256,
            working_length: 256,
        }
    }
}

impl GenerationSettings {
    /// Reject values the decoder cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.beam_size == 0 {
            return Err(SettingsError::InvalidValue(
                "beamSize must be at least 1".into(),
            ));
        }
        if !self.repetition_penalty.is_finite() || self.repetition_penalty <= 0.0 {
            return Err(SettingsError::InvalidValue(format!(
                "repetitionPenalty must be a positive number, got {}",
                self.repetition_penalty
            )));
        }
        if self.max_length == 0 {
            return Err(SettingsError::InvalidValue(
                "maxLength must be at least 1".into(),
            ));
        }
        if self.max_length > self.working_length {
            return Err(SettingsError::InvalidValue(format!(
                "maxLength {} exceeds workingLength {}",
                self.max_length, self.working_length
            )));
        }
        Ok(())
    }
}

/// Fallbacks used when a request names an unknown or no language.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanguageSettings {
    /// Model code used for unrecognized source language names.
    pub fallback_source_code: String,
    /// Model code used for unrecognized target language names.
    pub fallback_target_code: String,
    /// Source language name assumed when a request omits it.
    pub default_source: String,
    /// Target language name assumed when a request omits it.
    pub default_target: String,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            fallback_source_code: "eng_Latn".to_string(),
            fallback_target_code: "deu_Latn".to_string(),
            default_source: "English".to_string(),
            default_target: "German".to_string(),
        }
    }
}

/// Diagnostic logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}
