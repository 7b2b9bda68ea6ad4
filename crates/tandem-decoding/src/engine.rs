//! The autoregressive generation loop.

use std::sync::Arc;

use ndarray::Array2;
use tandem_core::{SpecialTokens, TokenId};
use tandem_inference::SequenceModel;
use tracing::{debug, trace};

use crate::beam::{BeamSearch, Candidate};
use crate::config::{GenerationConfig, PREFIX_LEN};
use crate::errors::{DecodingError, Result};
use crate::logits::{log_softmax, top_k};
use crate::repetition::{apply_repetition_penalty, block_repeated_ngrams};

/// Generates output token sequences from a [`SequenceModel`].
pub struct DecodingEngine {
    model: Arc<dyn SequenceModel>,
    special: SpecialTokens,
}

impl DecodingEngine {
    /// Create an engine over `model` with the model's reserved tokens.
    pub fn new(model: Arc<dyn SequenceModel>, special: SpecialTokens) -> Self {
        Self { model, special }
    }

    /// Generate the output sequence for one source sentence.
    ///
    /// Returns the generated tokens without the start and forced tokens. A
    /// trailing EOS is kept when the sequence terminated on its own.
    pub fn generate(
        &self,
        source_ids: &[TokenId],
        attention_mask: &[i64],
        forced_token: TokenId,
        config: &GenerationConfig,
    ) -> Result<Vec<TokenId>> {
        config.validate()?;
        if source_ids.len() != attention_mask.len() {
            return Err(DecodingError::InvalidInput(format!(
                "{} source ids but {} mask entries",
                source_ids.len(),
                attention_mask.len()
            )));
        }

        let (source_ids, attention_mask) =
            truncate_source(source_ids, attention_mask, config.working_length);
        let hidden = self.model.encode(&source_ids, &attention_mask)?;
        debug!(
            source_len = source_ids.len(),
            beam_size = config.beam_size,
            max_length = config.max_length,
            "encoded source"
        );

        let prefix = vec![self.special.bos, forced_token];
        let mut beam = BeamSearch::new(config.beam_size, prefix, self.special.eos);
        let mut steps = 0;

        while steps < config.step_budget() && !beam.is_done() {
            let mut candidates = Vec::new();
            let mut stalled = Vec::new();
            for (parent, hypothesis) in beam.live().iter().enumerate() {
                let scores =
                    self.next_token_scores(&hypothesis.tokens, &hidden, &attention_mask, config)?;
                let best = top_k(&scores, config.beam_size);
                if best.is_empty() {
                    stalled.push(parent);
                }
                for index in best {
                    #[allow(clippy::cast_possible_wrap)]
                    let token = index as TokenId;
                    candidates.push(Candidate {
                        parent,
                        token,
                        score: hypothesis.score + scores[index],
                    });
                }
            }
            beam.advance(candidates, &stalled);
            steps += 1;
            trace!(
                step = steps,
                live = beam.live().len(),
                finished = beam.finished_len(),
                "decode step"
            );
        }

        let best = beam.into_best().map(|h| h.tokens).unwrap_or_default();
        let output: Vec<TokenId> = best.into_iter().skip(PREFIX_LEN).collect();
        debug!(steps, output_len = output.len(), "generation finished");
        Ok(output)
    }

    /// Log-probabilities of every next token after repetition control.
    fn next_token_scores(
        &self,
        tokens: &[TokenId],
        hidden: &Array2<f32>,
        attention_mask: &[i64],
        config: &GenerationConfig,
    ) -> Result<Vec<f32>> {
        let input = pad_to(tokens, config.working_length, self.special.pad)?;
        let logits = self.model.decode(&input, hidden, attention_mask)?;

        let position = tokens.len() - 1;
        if position >= logits.nrows() {
            return Err(DecodingError::MissingRow {
                rows: logits.nrows(),
                position,
            });
        }
        let mut row = logits.row(position).to_vec();
        if config.penalizes_repetition() {
            apply_repetition_penalty(&mut row, tokens, config.repetition_penalty);
        }
        block_repeated_ngrams(&mut row, tokens, config.no_repeat_ngram_size);
        Ok(log_softmax(&row))
    }
}

/// Right-pad `tokens` with `pad` to exactly `working_length` entries.
pub fn pad_to(tokens: &[TokenId], working_length: usize, pad: TokenId) -> Result<Vec<TokenId>> {
    if tokens.len() > working_length {
        return Err(DecodingError::InvalidConfig(format!(
            "sequence of {} tokens exceeds working length {working_length}",
            tokens.len()
        )));
    }
    let mut input = Vec::with_capacity(working_length);
    input.extend_from_slice(tokens);
    input.resize(working_length, pad);
    Ok(input)
}

/// Cut the source to `working_length`, keeping its final token (`</s>`).
fn truncate_source(ids: &[TokenId], mask: &[i64], working_length: usize) -> (Vec<TokenId>, Vec<i64>) {
    if ids.len() <= working_length || working_length == 0 {
        return (ids.to_vec(), mask.to_vec());
    }
    debug!(source_len = ids.len(), working_length, "truncating source");
    let keep = working_length - 1;
    let mut ids_out = ids[..keep].to_vec();
    let mut mask_out = mask[..keep].to_vec();
    ids_out.push(ids[ids.len() - 1]);
    mask_out.push(mask[mask.len() - 1]);
    (ids_out, mask_out)
}
