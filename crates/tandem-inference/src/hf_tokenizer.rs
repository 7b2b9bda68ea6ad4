//! `tokenizers`-backed implementations of the tokenizer interfaces
//! (feature-gated behind `ort`).

use std::path::{Path, PathBuf};

use tandem_core::TokenId;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::errors::{InferenceError, Result, ResultExt};
use crate::traits::{SubwordTokenizer, TranslationTokenizer};

const EOS_TOKEN: &str = "</s>";
const UNK_TOKEN: &str = "[UNK]";
const CLS_TOKEN: &str = "[CLS]";
const SEP_TOKEN: &str = "[SEP]";

fn load_file(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path).tokenizer(&format!("load {}", path.display()))
}

fn to_token_ids(ids: &[u32]) -> Vec<TokenId> {
    ids.iter().map(|&id| TokenId::from(id)).collect()
}

fn required_id(tokenizer: &Tokenizer, token: &str) -> Result<TokenId> {
    tokenizer
        .token_to_id(token)
        .map(TokenId::from)
        .ok_or_else(|| InferenceError::Tokenizer(format!("vocabulary has no {token}")))
}

/// NLLB SentencePiece tokenizer.
pub struct HfTranslationTokenizer {
    inner: Tokenizer,
    eos: TokenId,
}

impl HfTranslationTokenizer {
    /// Load `tokenizer.json`.
    pub fn load(path: &Path) -> Result<Self> {
        info!(tokenizer = %path.display(), "loading translation tokenizer");
        let inner = load_file(path)?;
        let eos = required_id(&inner, EOS_TOKEN)?;
        Ok(Self { inner, eos })
    }
}

impl TranslationTokenizer for HfTranslationTokenizer {
    fn encode(&self, text: &str, source_code: &str) -> Result<Vec<TokenId>> {
        let lang = self.language_token(source_code).ok_or_else(|| {
            InferenceError::Tokenizer(format!("unknown language code {source_code}"))
        })?;
        let encoding = self.inner.encode(text, false).tokenizer("encode")?;
        let mut ids = Vec::with_capacity(encoding.get_ids().len() + 2);
        ids.push(lang);
        ids.extend(to_token_ids(encoding.get_ids()));
        ids.push(self.eos);
        Ok(ids)
    }

    fn language_token(&self, code: &str) -> Option<TokenId> {
        self.inner.token_to_id(code).map(TokenId::from)
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        let ids: Vec<u32> = ids
            .iter()
            .map(|&id| u32::try_from(id))
            .collect::<std::result::Result<_, _>>()
            .tokenizer("token id out of range")?;
        self.inner.decode(&ids, true).tokenizer("decode")
    }
}

/// WordPiece tokenizer paired with the alignment encoder.
pub struct HfSubwordTokenizer {
    inner: Tokenizer,
    unk: TokenId,
    cls: TokenId,
    sep: TokenId,
}

impl HfSubwordTokenizer {
    /// Load from a local `tokenizer.json`.
    pub fn load(path: &Path) -> Result<Self> {
        info!(tokenizer = %path.display(), "loading alignment tokenizer");
        Self::from_tokenizer(load_file(path)?)
    }

    /// Fetch `tokenizer.json` for `repo` through the Hugging Face cache.
    pub fn from_hub(repo: &str) -> Result<Self> {
        let path = download_tokenizer(repo)?;
        Self::load(&path)
    }

    fn from_tokenizer(inner: Tokenizer) -> Result<Self> {
        Ok(Self {
            unk: required_id(&inner, UNK_TOKEN)?,
            cls: required_id(&inner, CLS_TOKEN)?,
            sep: required_id(&inner, SEP_TOKEN)?,
            inner,
        })
    }
}

fn download_tokenizer(repo: &str) -> Result<PathBuf> {
    debug!(repo, "fetching tokenizer via hf-hub");
    let api = hf_hub::api::sync::ApiBuilder::new()
        .with_progress(false)
        .build()
        .tokenizer("hf-hub api")?;
    api.model(repo.to_string())
        .get("tokenizer.json")
        .tokenizer(&format!("tokenizer download ({repo})"))
}

impl SubwordTokenizer for HfSubwordTokenizer {
    fn subwords(&self, word: &str) -> Result<Vec<TokenId>> {
        let encoding = self.inner.encode(word, false).tokenizer("encode word")?;
        Ok(to_token_ids(encoding.get_ids()))
    }

    fn unk_id(&self) -> TokenId {
        self.unk
    }

    fn cls_id(&self) -> TokenId {
        self.cls
    }

    fn sep_id(&self) -> TokenId {
        self.sep
    }
}
