//! Language name to NLLB code resolution.

use tandem_settings::LanguageSettings;
use tracing::debug;

/// Language names the bridge understands, with their model codes.
pub const LANGUAGE_CODES: [(&str, &str); 18] = [
    ("English", "eng_Latn"),
    ("German", "deu_Latn"),
    ("Spanish", "spa_Latn"),
    ("French", "fra_Latn"),
    ("Italian", "ita_Latn"),
    ("Portuguese", "por_Latn"),
    ("Russian", "rus_Cyrl"),
    ("Chinese", "zho_Hans"),
    ("Japanese", "jpn_Jpan"),
    ("Korean", "kor_Hang"),
    ("Arabic", "arb_Arab"),
    ("Dutch", "nld_Latn"),
    ("Polish", "pol_Latn"),
    ("Turkish", "tur_Latn"),
    ("Czech", "ces_Latn"),
    ("Ukrainian", "ukr_Cyrl"),
    ("Vietnamese", "vie_Latn"),
    ("Hindi", "hin_Deva"),
];

/// Closed name → code table with per-side fallbacks.
///
/// Unknown names are not an error: they resolve to the fallback code of
/// their side (English for sources, German for targets by default).
#[derive(Clone, Debug)]
pub struct LanguageTable {
    fallback_source: String,
    fallback_target: String,
    default_source: String,
    default_target: String,
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::from(&LanguageSettings::default())
    }
}

impl From<&LanguageSettings> for LanguageTable {
    fn from(settings: &LanguageSettings) -> Self {
        Self {
            fallback_source: settings.fallback_source_code.clone(),
            fallback_target: settings.fallback_target_code.clone(),
            default_source: settings.default_source.clone(),
            default_target: settings.default_target.clone(),
        }
    }
}

impl LanguageTable {
    /// Exact lookup, no fallback.
    pub fn code(name: &str) -> Option<&'static str> {
        LANGUAGE_CODES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, code)| *code)
    }

    /// Code for a source language name.
    pub fn resolve_source<'a>(&'a self, name: &str) -> &'a str {
        Self::code(name).unwrap_or_else(|| {
            debug!(name, fallback = %self.fallback_source, "unknown source language");
            &self.fallback_source
        })
    }

    /// Code for a target language name.
    pub fn resolve_target<'a>(&'a self, name: &str) -> &'a str {
        Self::code(name).unwrap_or_else(|| {
            debug!(name, fallback = %self.fallback_target, "unknown target language");
            &self.fallback_target
        })
    }

    /// Source name assumed when a request names none.
    pub fn default_source(&self) -> &str {
        &self.default_source
    }

    /// Target name assumed when a request names none.
    pub fn default_target(&self) -> &str {
        &self.default_target
    }
}
