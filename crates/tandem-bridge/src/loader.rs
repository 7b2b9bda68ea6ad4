//! Builds a [`TranslationSession`] from settings.
//!
//! Every fatal failure is tagged with the stage that produced it so the
//! protocol can report it as `init_failed`. The aligner is optional: when it
//! cannot be loaded the session runs without word links.

use std::path::Path;
use std::sync::Arc;

use tandem_align::AlignmentEngine;
use tandem_decoding::{DecodingEngine, GenerationConfig};
use tandem_inference::{
    AlignerPaths, HfSubwordTokenizer, HfTranslationTokenizer, ModelConfig, ModelPaths,
    OnnxEmbeddingProvider, OnnxSequenceModel, SubwordTokenizer,
};
use tandem_rpc::InitFailure;
use tandem_session::{LanguageTable, TranslationSession};
use tandem_settings::{BridgeSettings, ModelSettings, load_settings_from_path};
use tracing::{info, warn};

/// Failure kind for settings that do not validate.
pub const SETTINGS_ERROR: &str = "SettingsError";
/// Failure kind for the translation model.
pub const MODEL_LOAD: &str = "ModelLoad";
/// Failure kind for the translation tokenizer.
pub const TOKENIZER_LOAD: &str = "TokenizerLoad";

/// Read the settings file at `path`, reporting failures as `SettingsError`.
pub fn load_settings(path: &Path) -> Result<BridgeSettings, InitFailure> {
    load_settings_from_path(path).map_err(|e| {
        InitFailure::new(
            SETTINGS_ERROR,
            format!("failed to load settings from {}: {e}", path.display()),
        )
    })
}

/// Load every model named by `settings` into a ready session.
pub fn build_session(settings: &BridgeSettings) -> Result<TranslationSession, InitFailure> {
    settings
        .validate()
        .map_err(|e| InitFailure::new(SETTINGS_ERROR, e.to_string()))?;

    let models = &settings.models;
    let paths = ModelPaths::new(
        &models.model_dir,
        &models.tokenizer_dir,
        &models.encoder_file,
        &models.decoder_file,
    );
    paths
        .ensure_present()
        .map_err(|e| InitFailure::new(MODEL_LOAD, e.to_string()))?;

    let special = ModelConfig::load(&paths.config)
        .map_err(|e| InitFailure::new(MODEL_LOAD, e.to_string()))?
        .special_tokens();
    let tokenizer = HfTranslationTokenizer::load(&paths.tokenizer)
        .map_err(|e| InitFailure::new(TOKENIZER_LOAD, e.to_string()))?;
    let model = OnnxSequenceModel::load(&paths, models.intra_threads)
        .map_err(|e| InitFailure::new(MODEL_LOAD, e.to_string()))?;
    info!(model_dir = %models.model_dir, "translation model loaded");

    let session = TranslationSession::new(
        Arc::new(tokenizer),
        DecodingEngine::new(Arc::new(model), special),
        LanguageTable::from(&settings.languages),
        GenerationConfig::from(&settings.generation),
    );

    Ok(match load_aligner(models) {
        Some(aligner) => session.with_aligner(aligner),
        None => session,
    })
}

/// Load the alignment engine, or `None` to run without word links.
pub fn load_aligner(models: &ModelSettings) -> Option<AlignmentEngine> {
    let Some(dir) = models.aligner_dir.as_deref().filter(|d| !d.is_empty()) else {
        info!("no aligner configured, alignment disabled");
        return None;
    };
    let dir = Path::new(dir);
    if !dir.is_dir() {
        warn!(path = %dir.display(), "aligner directory not found, alignment disabled");
        return None;
    }

    let paths = AlignerPaths::from_dir(dir, &models.aligner_file);
    if !paths.model.exists() {
        warn!(path = %paths.model.display(), "aligner model not found, alignment disabled");
        return None;
    }

    // one thread is plenty for a single short sentence pair
    let provider = match OnnxEmbeddingProvider::load(&paths.model, 1) {
        Ok(provider) => provider,
        Err(e) => {
            warn!(error = %e, "failed to load aligner model, alignment disabled");
            return None;
        }
    };

    let tokenizer: Result<HfSubwordTokenizer, _> = match &paths.tokenizer {
        Some(local) => HfSubwordTokenizer::load(local),
        None => HfSubwordTokenizer::from_hub(&models.aligner_tokenizer),
    };
    let tokenizer: Arc<dyn SubwordTokenizer> = match tokenizer {
        Ok(tokenizer) => Arc::new(tokenizer),
        Err(e) => {
            warn!(error = %e, "failed to load aligner tokenizer, alignment disabled");
            return None;
        }
    };

    info!(path = %dir.display(), "aligner loaded");
    Some(AlignmentEngine::new(Arc::new(provider), tokenizer))
}
