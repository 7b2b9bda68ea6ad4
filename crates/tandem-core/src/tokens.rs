//! Token identifiers and the special tokens a sequence model reserves.

use serde::{Deserialize, Serialize};

/// Integer token id as consumed by the ONNX models (`int64` tensors).
pub type TokenId = i64;

/// Reserved token ids of a sequence-to-sequence model.
///
/// NLLB-200 reuses `</s>` (id 2) as the decoder start token, so `bos` and
/// `eos` are usually equal. Padding is id 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialTokens {
    /// Token that opens every decoder sequence.
    pub bos: TokenId,
    /// Token that terminates generation.
    pub eos: TokenId,
    /// Token used to right-pad decoder input to the working length.
    pub pad: TokenId,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            bos: 2,
            eos: 2,
            pad: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_nllb() {
        let special = SpecialTokens::default();
        assert_eq!(special.bos, 2);
        assert_eq!(special.eos, 2);
        assert_eq!(special.pad, 1);
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_value(SpecialTokens::default()).unwrap();
        assert_eq!(json, serde_json::json!({"bos": 2, "eos": 2, "pad": 1}));
    }
}
