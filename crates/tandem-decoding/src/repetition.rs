//! Repetition control applied to a logits row before token selection.
//!
//! Both rules look at the whole hypothesis, prefix tokens included.

use std::collections::{HashMap, HashSet};

use tandem_core::TokenId;

fn slot(logits: &[f32], token: TokenId) -> Option<usize> {
    usize::try_from(token).ok().filter(|&i| i < logits.len())
}

/// Penalize every token already present in `sequence`.
///
/// Positive logits are divided by `penalty`, negative ones multiplied, so a
/// penalty above 1 always makes a seen token less likely. Each distinct
/// token is penalized once.
pub fn apply_repetition_penalty(logits: &mut [f32], sequence: &[TokenId], penalty: f32) {
    let mut seen = HashSet::new();
    for &token in sequence {
        if !seen.insert(token) {
            continue;
        }
        if let Some(i) = slot(logits, token) {
            let v = logits[i];
            logits[i] = if v > 0.0 { v / penalty } else { v * penalty };
        }
    }
}

/// Tokens that would complete an n-gram already present in `sequence`.
pub fn banned_ngram_tokens(sequence: &[TokenId], ngram_size: usize) -> Vec<TokenId> {
    if ngram_size == 0 || sequence.len() + 1 < ngram_size {
        return Vec::new();
    }
    let prefix_len = ngram_size - 1;
    let mut continuations: HashMap<&[TokenId], Vec<TokenId>> = HashMap::new();
    for gram in sequence.windows(ngram_size) {
        continuations
            .entry(&gram[..prefix_len])
            .or_default()
            .push(gram[prefix_len]);
    }
    let tail = &sequence[sequence.len() - prefix_len..];
    continuations.remove(tail).unwrap_or_default()
}

/// Force the logit of every n-gram-completing token to `-inf`.
pub fn block_repeated_ngrams(logits: &mut [f32], sequence: &[TokenId], ngram_size: usize) {
    for token in banned_ngram_tokens(sequence, ngram_size) {
        if let Some(i) = slot(logits, token) {
            logits[i] = f32::NEG_INFINITY;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalty_shrinks_positive_and_grows_negative() {
        let mut logits = vec![2.4, -1.0, 3.0];
        apply_repetition_penalty(&mut logits, &[0, 1], 1.2);
        assert!((logits[0] - 2.0).abs() < 1e-6);
        assert!((logits[1] + 1.2).abs() < 1e-6);
        assert!((logits[2] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn penalty_applies_once_per_token() {
        let mut logits = vec![1.44];
        apply_repetition_penalty(&mut logits, &[0, 0, 0], 1.2);
        assert!((logits[0] - 1.2).abs() < 1e-6);
    }

    #[test]
    fn penalty_ignores_out_of_range_ids() {
        let mut logits = vec![1.0, 1.0];
        apply_repetition_penalty(&mut logits, &[-1, 7], 2.0);
        assert_eq!(logits, vec![1.0, 1.0]);
    }

    #[test]
    fn bans_completion_of_seen_trigram() {
        // "a b c ... a b" must not be followed by "c" again
        let seq = [10, 11, 12, 13, 10, 11];
        assert_eq!(banned_ngram_tokens(&seq, 3), vec![12]);
    }

    #[test]
    fn collects_every_continuation_of_prefix() {
        let seq = [1, 2, 1, 3, 1];
        let mut banned = banned_ngram_tokens(&seq, 2);
        banned.sort_unstable();
        assert_eq!(banned, vec![2, 3]);
    }

    #[test]
    fn unigram_blocking_bans_all_seen() {
        let mut banned = banned_ngram_tokens(&[4, 5, 4], 1);
        banned.sort_unstable();
        banned.dedup();
        assert_eq!(banned, vec![4, 5]);
    }

    #[test]
    fn zero_size_or_short_sequence_bans_nothing() {
        assert!(banned_ngram_tokens(&[1, 2, 1, 2], 0).is_empty());
        assert!(banned_ngram_tokens(&[1], 3).is_empty());
    }

    #[test]
    fn blocking_sets_neg_infinity() {
        let mut logits = vec![0.0; 4];
        block_repeated_ngrams(&mut logits, &[1, 2, 1], 2);
        assert_eq!(logits[2], f32::NEG_INFINITY);
        assert_eq!(logits[1], 0.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn banned_token_always_recreates_an_existing_ngram(
                seq in prop::collection::vec(0i64..5, 0..24),
                n in 1usize..4,
            ) {
                for token in banned_ngram_tokens(&seq, n) {
                    let mut extended = seq.clone();
                    extended.push(token);
                    let candidate = &extended[extended.len() - n..];
                    prop_assert!(seq.windows(n).any(|w| w == candidate));
                }
            }

            #[test]
            fn penalty_never_raises_a_seen_logit(
                logits in prop::collection::vec(-20.0f32..20.0, 1..16),
                penalty in 1.0f32..3.0,
            ) {
                let seq: Vec<TokenId> = (0..logits.len() as TokenId).collect();
                let mut adjusted = logits.clone();
                apply_repetition_penalty(&mut adjusted, &seq, penalty);
                for (before, after) in logits.iter().zip(&adjusted) {
                    prop_assert!(after <= before);
                }
            }
        }
    }
}
