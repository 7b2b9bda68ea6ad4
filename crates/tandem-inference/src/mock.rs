//! Deterministic collaborators for tests and dry runs.
//!
//! None of these load model files. They reproduce the contracts in
//! [`crate::traits`] closely enough to exercise decoding, alignment and the
//! protocol end to end.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::Array2;
use tandem_core::{SpecialTokens, TokenId};

use crate::errors::{InferenceError, Result};
use crate::traits::{EmbeddingProvider, SequenceModel, SubwordTokenizer, TranslationTokenizer};

/// Logit given to the scripted token at each position.
const SCRIPTED_LOGIT: f32 = 10.0;
/// Hidden size of the stub encoder output.
const STUB_HIDDEN: usize = 4;

/// A sequence model that emits a fixed token script.
///
/// Decoder row `p` predicts the token at position `p + 1`. Positions 0 and 1
/// hold the start and forced language tokens, so row `p >= 1` points at
/// `script[p - 1]` and at EOS once the script is exhausted.
pub struct ScriptedSequenceModel {
    script: Vec<TokenId>,
    vocab_size: usize,
    eos: TokenId,
    encode_calls: AtomicUsize,
    decode_calls: AtomicUsize,
}

impl ScriptedSequenceModel {
    /// Create a model emitting `script` then EOS, over a `vocab_size` vocabulary.
    pub fn new(script: Vec<TokenId>, vocab_size: usize) -> Self {
        Self {
            script,
            vocab_size,
            eos: SpecialTokens::default().eos,
            encode_calls: AtomicUsize::new(0),
            decode_calls: AtomicUsize::new(0),
        }
    }

    /// Use a different EOS id.
    #[must_use]
    pub fn with_eos(mut self, eos: TokenId) -> Self {
        self.eos = eos;
        self
    }

    /// Number of `encode` invocations so far.
    pub fn encode_calls(&self) -> usize {
        self.encode_calls.load(Ordering::SeqCst)
    }

    /// Number of `decode` invocations so far.
    pub fn decode_calls(&self) -> usize {
        self.decode_calls.load(Ordering::SeqCst)
    }

    fn token_after(&self, position: usize) -> TokenId {
        position
            .checked_sub(1)
            .and_then(|i| self.script.get(i).copied())
            .unwrap_or(self.eos)
    }
}

impl SequenceModel for ScriptedSequenceModel {
    fn encode(&self, input_ids: &[TokenId], _attention_mask: &[i64]) -> Result<Array2<f32>> {
        let _ = self.encode_calls.fetch_add(1, Ordering::SeqCst);
        #[allow(clippy::cast_precision_loss)]
        Ok(Array2::from_shape_fn((input_ids.len(), STUB_HIDDEN), |(i, j)| {
            input_ids[i] as f32 + j as f32
        }))
    }

    fn decode(
        &self,
        input_ids: &[TokenId],
        _encoder_hidden_states: &Array2<f32>,
        _encoder_attention_mask: &[i64],
    ) -> Result<Array2<f32>> {
        let _ = self.decode_calls.fetch_add(1, Ordering::SeqCst);
        let mut logits = Array2::<f32>::zeros((input_ids.len(), self.vocab_size));
        for p in 0..input_ids.len() {
            let Ok(token) = usize::try_from(self.token_after(p)) else {
                continue;
            };
            if token < self.vocab_size {
                logits[[p, token]] = SCRIPTED_LOGIT;
            }
        }
        Ok(logits)
    }
}

/// Reserved entries at the head of every [`VocabTokenizer`].
pub const RESERVED_TOKENS: [&str; 4] = ["<s>", "<pad>", "</s>", "<unk>"];

/// A fixed-vocabulary WordPiece tokenizer.
///
/// Ids 0-3 are `<s>`, `<pad>`, `</s>`, `<unk>` (NLLB layout). Continuation
/// pieces are spelled with a `##` prefix. Serves both as the translation
/// tokenizer and as the alignment subword tokenizer.
pub struct VocabTokenizer {
    vocab: Vec<String>,
    index: HashMap<String, TokenId>,
    languages: HashSet<TokenId>,
}

impl VocabTokenizer {
    /// Build a vocabulary from `tokens`, appended after the reserved entries.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokenizer = Self {
            vocab: Vec::new(),
            index: HashMap::new(),
            languages: HashSet::new(),
        };
        for token in RESERVED_TOKENS {
            let _ = tokenizer.insert(token.to_string());
        }
        for token in tokens {
            let _ = tokenizer.insert(token.into());
        }
        tokenizer
    }

    /// Register language code tokens (e.g. `deu_Latn`).
    #[must_use]
    pub fn with_languages<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for code in codes {
            let id = self.insert(code.into());
            let _ = self.languages.insert(id);
        }
        self
    }

    /// Id of an exact vocabulary entry.
    pub fn id(&self, token: &str) -> Option<TokenId> {
        self.index.get(token).copied()
    }

    /// Ids of several entries; unknown entries map to `<unk>`.
    pub fn ids(&self, tokens: &[&str]) -> Vec<TokenId> {
        tokens
            .iter()
            .map(|t| self.id(t).unwrap_or(UNK_ID))
            .collect()
    }

    /// Vocabulary size.
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    /// Whether only the reserved entries exist.
    pub fn is_empty(&self) -> bool {
        self.vocab.len() == RESERVED_TOKENS.len()
    }

    fn insert(&mut self, token: String) -> TokenId {
        if let Some(&id) = self.index.get(&token) {
            return id;
        }
        #[allow(clippy::cast_possible_wrap)]
        let id = self.vocab.len() as TokenId;
        let _ = self.index.insert(token.clone(), id);
        self.vocab.push(token);
        id
    }

    /// Greedy longest-match segmentation; empty when the word cannot be covered.
    fn wordpiece(&self, word: &str) -> Vec<TokenId> {
        let chars: Vec<char> = word.chars().collect();
        let mut pieces = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let mut end = chars.len();
            let mut found = None;
            while end > start {
                let piece: String = chars[start..end].iter().collect();
                let key = if start == 0 { piece } else { format!("##{piece}") };
                if let Some(&id) = self.index.get(&key) {
                    found = Some(id);
                    break;
                }
                end -= 1;
            }
            match found {
                Some(id) => {
                    pieces.push(id);
                    start = end;
                }
                None => return Vec::new(),
            }
        }
        pieces
    }

    fn is_special(&self, id: TokenId) -> bool {
        (0..RESERVED_TOKENS.len() as TokenId).contains(&id) || self.languages.contains(&id)
    }
}

const BOS_ID: TokenId = 0;
const EOS_ID: TokenId = 2;
const UNK_ID: TokenId = 3;

impl TranslationTokenizer for VocabTokenizer {
    fn encode(&self, text: &str, source_code: &str) -> Result<Vec<TokenId>> {
        let mut ids = vec![self.language_token(source_code).unwrap_or(UNK_ID)];
        for word in text.split_whitespace() {
            let pieces = self.wordpiece(word);
            if pieces.is_empty() {
                ids.push(UNK_ID);
            } else {
                ids.extend(pieces);
            }
        }
        ids.push(EOS_ID);
        Ok(ids)
    }

    fn language_token(&self, code: &str) -> Option<TokenId> {
        self.id(code).filter(|id| self.languages.contains(id))
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        let mut text = String::new();
        for &id in ids {
            if self.is_special(id) {
                continue;
            }
            let token = usize::try_from(id)
                .ok()
                .and_then(|i| self.vocab.get(i))
                .ok_or_else(|| InferenceError::Tokenizer(format!("id {id} out of range")))?;
            if let Some(rest) = token.strip_prefix("##") {
                text.push_str(rest);
            } else {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(token);
            }
        }
        Ok(text)
    }
}

impl SubwordTokenizer for VocabTokenizer {
    fn subwords(&self, word: &str) -> Result<Vec<TokenId>> {
        Ok(self.wordpiece(word))
    }

    fn unk_id(&self) -> TokenId {
        UNK_ID
    }

    fn cls_id(&self) -> TokenId {
        BOS_ID
    }

    fn sep_id(&self) -> TokenId {
        EOS_ID
    }
}

/// Embeds position `p` as the unit vector `e_(p mod dim)`.
///
/// Two sentences with the same number of subwords get an identity
/// similarity matrix, whatever the tokens are.
pub struct PositionalEmbeddingProvider {
    dim: usize,
    calls: AtomicUsize,
}

impl PositionalEmbeddingProvider {
    /// Create a provider with `dim` output dimensions.
    pub fn new(dim: usize) -> Self {
        Self {
            dim: dim.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for PositionalEmbeddingProvider {
    fn embed(&self, input_ids: &[TokenId], _attention_mask: &[i64]) -> Result<Array2<f32>> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        let dim = self.dim;
        Ok(Array2::from_shape_fn((input_ids.len(), dim), |(p, d)| {
            if p % dim == d { 1.0 } else { 0.0 }
        }))
    }
}

/// Embeds each token id with a fixed vector; unknown ids embed as zero.
pub struct LookupEmbeddingProvider {
    dim: usize,
    vectors: HashMap<TokenId, Vec<f32>>,
}

impl LookupEmbeddingProvider {
    /// Create a provider from an id → vector table.
    pub fn new(dim: usize, vectors: HashMap<TokenId, Vec<f32>>) -> Self {
        Self { dim, vectors }
    }
}

impl EmbeddingProvider for LookupEmbeddingProvider {
    fn embed(&self, input_ids: &[TokenId], _attention_mask: &[i64]) -> Result<Array2<f32>> {
        let mut out = Array2::<f32>::zeros((input_ids.len(), self.dim));
        for (row, id) in input_ids.iter().enumerate() {
            if let Some(v) = self.vectors.get(id) {
                if v.len() != self.dim {
                    return Err(InferenceError::Shape(format!(
                        "vector for id {id} has {} dims, expected {}",
                        v.len(),
                        self.dim
                    )));
                }
                for (d, x) in v.iter().enumerate() {
                    out[[row, d]] = *x;
                }
            }
        }
        Ok(out)
    }
}
