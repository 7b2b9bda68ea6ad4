//! Sentence-pair alignment.

use std::sync::Arc;

use ndarray::{Array2, s};
use tandem_core::{AlignmentLink, sorted_links};
use tandem_inference::{EmbeddingProvider, SubwordTokenizer};
use tracing::debug;

use crate::errors::{AlignmentError, Result};
use crate::normalize::normalize_rows;
use crate::similarity::{mutual_best, similarity_matrix};
use crate::word_map::WordPieces;

/// Aligns whole words of a sentence pair.
pub struct AlignmentEngine {
    provider: Arc<dyn EmbeddingProvider>,
    tokenizer: Arc<dyn SubwordTokenizer>,
}

impl AlignmentEngine {
    /// Create an engine from an embedding model and its tokenizer.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, tokenizer: Arc<dyn SubwordTokenizer>) -> Self {
        Self {
            provider,
            tokenizer,
        }
    }

    /// Mutual-best word links, sorted by `(s, t)` and free of duplicates.
    ///
    /// Returns no links, without running the embedding model, when either
    /// side has no words.
    pub fn align<S: AsRef<str>, T: AsRef<str>>(
        &self,
        source_words: &[S],
        target_words: &[T],
    ) -> Result<Vec<AlignmentLink>> {
        if source_words.is_empty() || target_words.is_empty() {
            return Ok(Vec::new());
        }

        let (source, source_map) = self.embed_words(source_words)?;
        let (target, target_map) = self.embed_words(target_words)?;
        let sim = similarity_matrix(&source, &target);

        let links = sorted_links(
            mutual_best(&sim)
                .into_iter()
                .map(|(i, j)| AlignmentLink::new(source_map[i], target_map[j])),
        );
        debug!(
            source_subwords = source_map.len(),
            target_subwords = target_map.len(),
            links = links.len(),
            "aligned sentence pair"
        );
        Ok(links)
    }

    /// Normalized subword embeddings without boundary rows, and the word map.
    fn embed_words<S: AsRef<str>>(&self, words: &[S]) -> Result<(Array2<f32>, Vec<usize>)> {
        let pieces = WordPieces::from_words(self.tokenizer.as_ref(), words)?;
        let input = pieces.framed(self.tokenizer.as_ref());
        let mask = vec![1_i64; input.len()];

        let hidden = self.provider.embed(&input, &mask)?;
        if hidden.nrows() != input.len() {
            return Err(AlignmentError::Shape(format!(
                "{} rows for {} tokens",
                hidden.nrows(),
                input.len()
            )));
        }

        let mut embeddings = hidden.slice(s![1..input.len() - 1, ..]).to_owned();
        normalize_rows(&mut embeddings);
        Ok((embeddings, pieces.word_map))
    }
}
