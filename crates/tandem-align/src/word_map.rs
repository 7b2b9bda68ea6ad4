//! Whole words to subword ids, with the reverse position map.

use tandem_core::TokenId;
use tandem_inference::SubwordTokenizer;

use crate::errors::Result;

/// Subword ids of a word list and the word each subword belongs to.
///
/// `word_map.len() == ids.len()`, and every word index in `0..words`
/// appears at least once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordPieces {
    /// Concatenated subword ids, without boundary markers.
    pub ids: Vec<TokenId>,
    /// Word index of each subword position.
    pub word_map: Vec<usize>,
}

impl WordPieces {
    /// Tokenize each word on its own; a word with no subwords becomes `unk`.
    pub fn from_words<S: AsRef<str>>(
        tokenizer: &dyn SubwordTokenizer,
        words: &[S],
    ) -> Result<Self> {
        let mut ids = Vec::new();
        let mut word_map = Vec::new();
        for (index, word) in words.iter().enumerate() {
            let mut pieces = tokenizer.subwords(word.as_ref())?;
            if pieces.is_empty() {
                pieces.push(tokenizer.unk_id());
            }
            word_map.extend(std::iter::repeat_n(index, pieces.len()));
            ids.extend(pieces);
        }
        Ok(Self { ids, word_map })
    }

    /// Model input: `[CLS] ids… [SEP]`.
    pub fn framed(&self, tokenizer: &dyn SubwordTokenizer) -> Vec<TokenId> {
        let mut framed = Vec::with_capacity(self.ids.len() + 2);
        framed.push(tokenizer.cls_id());
        framed.extend_from_slice(&self.ids);
        framed.push(tokenizer.sep_id());
        framed
    }

    /// Number of subwords.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether there are no subwords.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_inference::mock::VocabTokenizer;

    fn tokenizer() -> VocabTokenizer {
        VocabTokenizer::new(["Die", "Kat", "##ze", "saß", "."])
    }

    #[test]
    fn maps_each_subword_to_its_word() {
        let tok = tokenizer();
        let pieces = WordPieces::from_words(&tok, &["Die", "Katze", "."]).unwrap();
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces.word_map, vec![0, 1, 1, 2]);
    }

    #[test]
    fn unknown_word_falls_back_to_unk() {
        let tok = tokenizer();
        let pieces = WordPieces::from_words(&tok, &["Hund", "saß"]).unwrap();
        assert_eq!(pieces.ids[0], tok.unk_id());
        assert_eq!(pieces.word_map, vec![0, 1]);
    }

    #[test]
    fn framing_adds_boundaries() {
        let tok = tokenizer();
        let pieces = WordPieces::from_words(&tok, &["Die"]).unwrap();
        let framed = pieces.framed(&tok);
        assert_eq!(framed.first(), Some(&tok.cls_id()));
        assert_eq!(framed.last(), Some(&tok.sep_id()));
        assert_eq!(framed.len(), 3);
    }

    #[test]
    fn empty_word_list() {
        let tok = tokenizer();
        let words: [&str; 0] = [];
        let pieces = WordPieces::from_words(&tok, &words).unwrap();
        assert!(pieces.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_word_is_covered(words in prop::collection::vec("[a-zA-Zß.]{1,8}", 0..10)) {
                let tok = tokenizer();
                let pieces = WordPieces::from_words(&tok, &words).unwrap();
                prop_assert_eq!(pieces.word_map.len(), pieces.ids.len());
                for index in 0..words.len() {
                    prop_assert!(pieces.word_map.contains(&index));
                }
            }
        }
    }
}
