//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;
use tandem_settings::BridgeSettings;

/// NLLB translation and word alignment bridge.
#[derive(Parser, Debug)]
#[command(name = "tandem-bridge", about = "NLLB translation and word alignment bridge")]
pub struct Cli {
    /// Serve newline-delimited JSON requests on stdin.
    #[arg(long)]
    pub server: bool,

    /// Directory holding the encoder and decoder ONNX files.
    #[arg(long)]
    pub model_dir: Option<String>,

    /// Directory holding `tokenizer.json` and `config.json`.
    #[arg(long)]
    pub tokenizer_dir: Option<String>,

    /// Directory holding the alignment model (empty disables alignment).
    #[arg(long)]
    pub aligner_dir: Option<String>,

    /// Settings file (defaults to `~/.tandem/settings.json`).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log at debug level on stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Text to translate (single-shot mode).
    pub text: Option<String>,

    /// Source language name (single-shot mode).
    pub source: Option<String>,

    /// Target language name (single-shot mode).
    pub target: Option<String>,
}

/// Positional arguments of a single-shot run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleShot {
    /// Text to translate.
    pub text: String,
    /// Source language name.
    pub source: String,
    /// Target language name.
    pub target: String,
}

impl Cli {
    /// Apply flags over loaded settings; flags win.
    pub fn apply_overrides(&self, settings: &mut BridgeSettings) {
        if let Some(dir) = &self.model_dir {
            settings.models.model_dir.clone_from(dir);
        }
        if let Some(dir) = &self.tokenizer_dir {
            settings.models.tokenizer_dir.clone_from(dir);
        }
        if let Some(dir) = &self.aligner_dir {
            settings.models.aligner_dir = (!dir.is_empty()).then(|| dir.clone());
        }
    }

    /// The three positionals, when all are present and non-empty.
    pub fn single_shot(&self) -> Option<SingleShot> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Some(SingleShot {
            text: non_empty(&self.text)?,
            source: non_empty(&self.source)?,
            target: non_empty(&self.target)?,
        })
    }
}
