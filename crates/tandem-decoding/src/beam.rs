//! Hypothesis bookkeeping for beam search.
//!
//! Each step the caller scores continuations of every live hypothesis; the
//! beam keeps the best `width` of them overall. Continuations that end in
//! EOS leave the beam and join the finished pool, ranked by cumulative
//! log-probability divided by generated length.

use std::cmp::Ordering;

use tandem_core::TokenId;

/// A partial or complete output sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Hypothesis {
    /// Full decoder sequence, prefix included.
    pub tokens: Vec<TokenId>,
    /// Sum of token log-probabilities after the prefix.
    pub score: f32,
}

/// One scored continuation of a live hypothesis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Index into [`BeamSearch::live`].
    pub parent: usize,
    /// Appended token.
    pub token: TokenId,
    /// Parent score plus the token's log-probability.
    pub score: f32,
}

#[derive(Debug)]
struct Finished {
    hypothesis: Hypothesis,
    normalized: f32,
}

/// Live and finished hypotheses of one `generate` call.
#[derive(Debug)]
pub struct BeamSearch {
    width: usize,
    prefix_len: usize,
    eos: TokenId,
    live: Vec<Hypothesis>,
    finished: Vec<Finished>,
}

impl BeamSearch {
    /// Start from a single hypothesis holding `prefix`.
    pub fn new(width: usize, prefix: Vec<TokenId>, eos: TokenId) -> Self {
        Self {
            width: width.max(1),
            prefix_len: prefix.len(),
            eos,
            live: vec![Hypothesis {
                tokens: prefix,
                score: 0.0,
            }],
            finished: Vec::new(),
        }
    }

    /// Hypotheses still being extended, best first.
    pub fn live(&self) -> &[Hypothesis] {
        &self.live
    }

    /// Number of hypotheses that reached EOS or stalled.
    pub fn finished_len(&self) -> usize {
        self.finished.len()
    }

    /// Keep the best `width` candidates and extend their parents.
    ///
    /// `stalled` lists live hypotheses that had no admissible continuation;
    /// they join the finished pool as they are.
    pub fn advance(&mut self, mut candidates: Vec<Candidate>, stalled: &[usize]) {
        for &index in stalled {
            if let Some(hypothesis) = self.live.get(index).cloned() {
                self.push_finished(hypothesis);
            }
        }

        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.parent.cmp(&b.parent))
                .then(a.token.cmp(&b.token))
        });
        candidates.truncate(self.width);

        let mut next = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let Some(parent) = self.live.get(candidate.parent) else {
                continue;
            };
            let mut tokens = Vec::with_capacity(parent.tokens.len() + 1);
            tokens.extend_from_slice(&parent.tokens);
            tokens.push(candidate.token);
            let hypothesis = Hypothesis {
                tokens,
                score: candidate.score,
            };
            if candidate.token == self.eos {
                self.push_finished(hypothesis);
            } else {
                next.push(hypothesis);
            }
        }
        self.live = next;
    }

    /// Whether further steps cannot change the result.
    ///
    /// True when nothing is live, or when `width` hypotheses have finished and
    /// the best live one no longer outranks the worst of them.
    pub fn is_done(&self) -> bool {
        let Some(best_live) = self.live.first() else {
            return true;
        };
        if self.finished.len() < self.width {
            return false;
        }
        let worst = self
            .finished
            .last()
            .map_or(f32::NEG_INFINITY, |f| f.normalized);
        worst >= self.normalize(best_live)
    }

    /// Best hypothesis overall; remaining live hypotheses compete too.
    pub fn into_best(mut self) -> Option<Hypothesis> {
        for hypothesis in std::mem::take(&mut self.live) {
            self.push_finished(hypothesis);
        }
        self.finished.into_iter().next().map(|f| f.hypothesis)
    }

    #[allow(clippy::cast_precision_loss)]
    fn normalize(&self, hypothesis: &Hypothesis) -> f32 {
        let generated = hypothesis.tokens.len().saturating_sub(self.prefix_len).max(1);
        hypothesis.score / generated as f32
    }

    fn push_finished(&mut self, hypothesis: Hypothesis) {
        let normalized = self.normalize(&hypothesis);
        let at = self
            .finished
            .partition_point(|f| f.normalized.total_cmp(&normalized) != Ordering::Less);
        self.finished.insert(
            at,
            Finished {
                hypothesis,
                normalized,
            },
        );
        self.finished.truncate(self.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EOS: TokenId = 2;

    fn cand(parent: usize, token: TokenId, score: f32) -> Candidate {
        Candidate {
            parent,
            token,
            score,
        }
    }

    #[test]
    fn width_one_is_greedy() {
        let mut beam = BeamSearch::new(1, vec![2, 9], EOS);
        beam.advance(vec![cand(0, 5, -0.1), cand(0, 6, -0.5)], &[]);
        assert_eq!(beam.live().len(), 1);
        assert_eq!(beam.live()[0].tokens, vec![2, 9, 5]);

        beam.advance(vec![cand(0, EOS, -0.2), cand(0, 7, -0.3)], &[]);
        assert!(beam.live().is_empty());
        assert!(beam.is_done());
        assert_eq!(beam.into_best().unwrap().tokens, vec![2, 9, 5, EOS]);
    }

    #[test]
    fn prunes_to_width_across_parents() {
        let mut beam = BeamSearch::new(2, vec![2, 9], EOS);
        beam.advance(vec![cand(0, 5, -0.1), cand(0, 6, -0.2), cand(0, 7, -0.3)], &[]);
        assert_eq!(beam.live().len(), 2);

        beam.advance(vec![
            cand(0, 8, -1.0),
            cand(1, 8, -0.4),
            cand(1, 4, -0.3),
            cand(0, 4, -2.0),
        ], &[]);
        let tokens: Vec<_> = beam.live().iter().map(|h| h.tokens.clone()).collect();
        assert_eq!(tokens, vec![vec![2, 9, 6, 4], vec![2, 9, 6, 8]]);
    }

    #[test]
    fn finished_hypotheses_leave_the_beam() {
        let mut beam = BeamSearch::new(2, vec![2, 9], EOS);
        beam.advance(vec![cand(0, 5, -0.1), cand(0, EOS, -3.0)], &[]);
        assert_eq!(beam.live().len(), 1);
        assert_eq!(beam.finished_len(), 1);
        assert!(!beam.is_done());
    }

    #[test]
    fn not_done_while_live_can_still_win() {
        let mut beam = BeamSearch::new(1, vec![2, 9], EOS);
        beam.advance(vec![cand(0, 5, -0.1)], &[]);
        beam.push_finished(Hypothesis {
            tokens: vec![2, 9, EOS],
            score: -10.0,
        });
        assert!(!beam.is_done());
        beam.push_finished(Hypothesis {
            tokens: vec![2, 9, 3, EOS],
            score: -0.01,
        });
        assert!(beam.is_done());
    }

    #[test]
    fn ranking_is_length_normalized() {
        let mut beam = BeamSearch::new(2, vec![2, 9], EOS);
        beam.live.clear();
        beam.push_finished(Hypothesis {
            tokens: vec![2, 9, EOS],
            score: -1.0,
        });
        beam.push_finished(Hypothesis {
            tokens: vec![2, 9, 4, 5, 6, EOS],
            score: -2.0,
        });
        let best = beam.into_best().unwrap();
        assert_eq!(best.tokens.len(), 6);
    }

    #[test]
    fn stalled_hypotheses_finish_as_they_are() {
        let mut beam = BeamSearch::new(2, vec![2, 9], EOS);
        beam.advance(vec![cand(0, 5, -0.1), cand(0, 6, -0.2)], &[]);
        beam.advance(vec![cand(0, 7, -0.3)], &[1]);
        assert_eq!(beam.live().len(), 1);
        assert_eq!(beam.live()[0].tokens, vec![2, 9, 5, 7]);
        assert_eq!(beam.finished_len(), 1);
    }

    #[test]
    fn budget_exhaustion_returns_best_live() {
        let mut beam = BeamSearch::new(2, vec![2, 9], EOS);
        beam.advance(vec![cand(0, 5, -0.1), cand(0, 6, -0.2)], &[]);
        assert_eq!(beam.into_best().unwrap().tokens, vec![2, 9, 5]);
    }
}
