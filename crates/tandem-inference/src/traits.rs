//! Collaborator interfaces consumed by the decoding and alignment engines.
//!
//! Implementations take `&self`; backends that need exclusive access to a
//! runtime session lock internally.

use ndarray::Array2;
use tandem_core::TokenId;

use crate::errors::Result;

/// An encoder-decoder translation model.
pub trait SequenceModel: Send + Sync {
    /// Encode source tokens into hidden states `[src_len, hidden]`.
    fn encode(&self, input_ids: &[TokenId], attention_mask: &[i64]) -> Result<Array2<f32>>;

    /// Score the next token at every decoder position.
    ///
    /// `input_ids` is the padded decoder input; the result is
    /// `[input_ids.len(), vocab]`.
    fn decode(
        &self,
        input_ids: &[TokenId],
        encoder_hidden_states: &Array2<f32>,
        encoder_attention_mask: &[i64],
    ) -> Result<Array2<f32>>;
}

/// A contextual subword embedding model (BERT-style).
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a full token sequence, boundary tokens included.
    ///
    /// Returns one row per input token: `[input_ids.len(), dim]`.
    fn embed(&self, input_ids: &[TokenId], attention_mask: &[i64]) -> Result<Array2<f32>>;
}

/// Tokenizer paired with the translation model.
pub trait TranslationTokenizer: Send + Sync {
    /// Encode `text` as `[source_code_token, subwords…, </s>]`.
    fn encode(&self, text: &str, source_code: &str) -> Result<Vec<TokenId>>;

    /// Id of a language code token such as `deu_Latn`.
    fn language_token(&self, code: &str) -> Option<TokenId>;

    /// Turn generated ids back into text, skipping special tokens.
    fn decode(&self, ids: &[TokenId]) -> Result<String>;
}

/// Tokenizer paired with the embedding model.
pub trait SubwordTokenizer: Send + Sync {
    /// Split one whole word into subword ids. May be empty.
    fn subwords(&self, word: &str) -> Result<Vec<TokenId>>;

    /// Placeholder id for words that yield no subwords.
    fn unk_id(&self) -> TokenId;

    /// Sequence start marker (`[CLS]`).
    fn cls_id(&self) -> TokenId;

    /// Sequence end marker (`[SEP]`).
    fn sep_id(&self) -> TokenId;
}
