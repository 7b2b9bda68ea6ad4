//! Process-wide generation parameters and their runtime updates.

use tandem_settings::GenerationSettings;

use crate::errors::{DecodingError, Result};

/// Number of tokens every decoder sequence starts with (start + language).
pub const PREFIX_LEN: usize = 2;

/// Parameters of one `generate` call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Live hypotheses kept per step; 1 is greedy decoding.
    pub beam_size: usize,
    /// Divides positive and multiplies negative logits of seen tokens.
    pub repetition_penalty: f32,
    /// Size of n-grams that may not repeat; 0 disables blocking.
    pub no_repeat_ngram_size: usize,
    /// Upper bound on the decoder sequence, prefix included.
    pub max_length: usize,
    /// Fixed length decoder input is padded to.
    pub working_length: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::from(&GenerationSettings::default())
    }
}

impl From<&GenerationSettings> for GenerationConfig {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            beam_size: settings.beam_size,
            repetition_penalty: settings.repetition_penalty,
            no_repeat_ngram_size: settings.no_repeat_ngram_size,
            max_length: settings.max_length,
            working_length: settings.working_length,
        }
    }
}

/// Fields of an `update_settings` command. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationUpdate {
    /// New beam width.
    pub beam_size: Option<usize>,
    /// New repetition penalty.
    pub repetition_penalty: Option<f32>,
    /// New no-repeat n-gram size.
    pub no_repeat_ngram_size: Option<usize>,
    /// New maximum length.
    pub max_length: Option<usize>,
}

impl GenerationConfig {
    /// Reject parameters the decoding loop cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.beam_size == 0 {
            return Err(DecodingError::InvalidConfig(
                "beam_size must be at least 1".into(),
            ));
        }
        if !self.repetition_penalty.is_finite() || self.repetition_penalty <= 0.0 {
            return Err(DecodingError::InvalidConfig(format!(
                "repetition_penalty must be a positive number, got {}",
                self.repetition_penalty
            )));
        }
        if self.max_length == 0 {
            return Err(DecodingError::InvalidConfig(
                "max_length must be at least 1".into(),
            ));
        }
        if self.max_length > self.working_length {
            return Err(DecodingError::InvalidConfig(format!(
                "max_length {} exceeds working length {}",
                self.max_length, self.working_length
            )));
        }
        Ok(())
    }

    /// Return a copy with `update` applied, validated as a whole.
    ///
    /// On error `self` is untouched, so a rejected update changes nothing.
    pub fn with_update(&self, update: &GenerationUpdate) -> Result<Self> {
        let next = Self {
            beam_size: update.beam_size.unwrap_or(self.beam_size),
            repetition_penalty: update.repetition_penalty.unwrap_or(self.repetition_penalty),
            no_repeat_ngram_size: update
                .no_repeat_ngram_size
                .unwrap_or(self.no_repeat_ngram_size),
            max_length: update.max_length.unwrap_or(self.max_length),
            working_length: self.working_length,
        };
        next.validate()?;
        Ok(next)
    }

    /// Maximum number of decoding steps after the two prefix tokens.
    pub fn step_budget(&self) -> usize {
        self.max_length.saturating_sub(PREFIX_LEN)
    }

    /// Whether the penalty changes any logit.
    pub fn penalizes_repetition(&self) -> bool {
        (self.repetition_penalty - 1.0).abs() > f32::EPSILON
    }
}
