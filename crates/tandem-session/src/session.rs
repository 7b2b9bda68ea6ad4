//! The translate-and-align operation.

use std::sync::Arc;

use parking_lot::RwLock;
use tandem_align::AlignmentEngine;
use tandem_core::AlignmentLink;
use tandem_decoding::{DecodingEngine, GenerationConfig, GenerationUpdate};
use tandem_inference::TranslationTokenizer;
use tracing::{debug, info};

use crate::errors::{Result, SessionError};
use crate::languages::LanguageTable;

/// Prefixes of text that is returned untouched.
const PASS_THROUGH_PREFIXES: [&str; 2] = ["http", "www"];

/// A translated sentence and its word alignment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Translation {
    /// Translated text.
    pub text: String,
    /// Word links sorted by `(s, t)`; empty without an aligner.
    pub links: Vec<AlignmentLink>,
}

/// Loaded models plus the live generation config.
pub struct TranslationSession {
    tokenizer: Arc<dyn TranslationTokenizer>,
    decoder: DecodingEngine,
    aligner: Option<AlignmentEngine>,
    languages: LanguageTable,
    config: RwLock<GenerationConfig>,
}

impl TranslationSession {
    /// Create a session without alignment.
    pub fn new(
        tokenizer: Arc<dyn TranslationTokenizer>,
        decoder: DecodingEngine,
        languages: LanguageTable,
        config: GenerationConfig,
    ) -> Self {
        Self {
            tokenizer,
            decoder,
            aligner: None,
            languages,
            config: RwLock::new(config),
        }
    }

    /// Attach an alignment engine.
    #[must_use]
    pub fn with_aligner(mut self, aligner: AlignmentEngine) -> Self {
        self.aligner = Some(aligner);
        self
    }

    /// Whether translations carry word links.
    pub fn has_aligner(&self) -> bool {
        self.aligner.is_some()
    }

    /// Language resolution used for requests.
    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    /// Snapshot of the current generation config.
    pub fn config(&self) -> GenerationConfig {
        self.config.read().clone()
    }

    /// Apply an `update_settings` command.
    ///
    /// The new config is validated as a whole; on error nothing changes.
    pub fn update_settings(&self, update: &GenerationUpdate) -> Result<GenerationConfig> {
        let mut config = self.config.write();
        let next = config.with_update(update)?;
        info!(
            beam_size = next.beam_size,
            repetition_penalty = next.repetition_penalty,
            no_repeat_ngram_size = next.no_repeat_ngram_size,
            max_length = next.max_length,
            "generation settings updated"
        );
        *config = next.clone();
        Ok(next)
    }

    /// Translate `text` and align it with the result.
    ///
    /// URLs (text starting with `http` or `www`) come back unchanged with no
    /// links and no model call. Unknown language names use the fallbacks.
    pub fn translate_and_align(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Translation> {
        if is_pass_through(text) {
            debug!("pass-through text, skipping translation");
            return Ok(Translation {
                text: text.to_string(),
                links: Vec::new(),
            });
        }

        let source_code = self.languages.resolve_source(source_lang);
        let target_code = self.languages.resolve_target(target_lang);
        let forced = self
            .tokenizer
            .language_token(target_code)
            .ok_or_else(|| SessionError::UnknownLanguageCode(target_code.to_string()))?;

        let source_ids = self.tokenizer.encode(text, source_code)?;
        let attention_mask = vec![1_i64; source_ids.len()];
        let config = self.config();
        debug!(source_code, target_code, tokens = source_ids.len(), "translating");

        let output = self
            .decoder
            .generate(&source_ids, &attention_mask, forced, &config)?;
        let translation = self.tokenizer.decode(&output)?;

        let links = match &self.aligner {
            Some(aligner) => {
                let source_words: Vec<&str> = text.split_whitespace().collect();
                let target_words: Vec<&str> = translation.split_whitespace().collect();
                aligner.align(&source_words, &target_words)?
            }
            None => Vec::new(),
        };

        Ok(Translation {
            text: translation,
            links,
        })
    }
}

fn is_pass_through(text: &str) -> bool {
    PASS_THROUGH_PREFIXES.iter().any(|p| text.starts_with(p))
}
