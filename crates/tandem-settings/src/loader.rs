//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`BridgeSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::BridgeSettings;

/// Resolve the path to the settings file (`~/.tandem/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".tandem").join("settings.json")
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error. Values are not validated here; callers
/// validate after applying their own overrides.
pub fn load_settings_from_path(path: &Path) -> Result<BridgeSettings> {
    let defaults = serde_json::to_value(BridgeSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: BridgeSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `TANDEM_*` environment variable overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut BridgeSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides using `lookup` as the variable source.
///
/// Each variable has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Floats must be finite and within the specified range
/// - Invalid values are logged and ignored (fall back to file/default)
pub fn apply_overrides_from(settings: &mut BridgeSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read_string = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let read_usize = |name: &str, min: usize, max: usize| {
        let val = lookup(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        result
    };

    // ── Model locations ─────────────────────────────────────────────
    if let Some(v) = read_string("TANDEM_MODEL_DIR") {
        settings.models.model_dir = v;
    }
    if let Some(v) = read_string("TANDEM_TOKENIZER_DIR") {
        settings.models.tokenizer_dir = v;
    }
    if let Some(v) = read_string("TANDEM_ALIGNER_DIR") {
        settings.models.aligner_dir = Some(v);
    }

    // ── Generation ──────────────────────────────────────────────────
    if let Some(v) = read_usize("TANDEM_BEAM_SIZE", 1, 64) {
        settings.generation.beam_size = v;
    }
    if let Some(v) = read_usize("TANDEM_MAX_LENGTH", 1, 4096) {
        settings.generation.max_length = v;
    }
    if let Some(v) = read_usize("TANDEM_NO_REPEAT_NGRAM_SIZE", 0, 16) {
        settings.generation.no_repeat_ngram_size = v;
    }
    if let Some(val) = lookup("TANDEM_REPETITION_PENALTY") {
        match parse_f32_range(&val, f32::MIN_POSITIVE, 10.0) {
            Some(v) => settings.generation.repetition_penalty = v,
            None => {
                tracing::warn!(key = "TANDEM_REPETITION_PENALTY", value = %val, "invalid f32 env var, ignoring");
            }
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_string("TANDEM_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a finite `f32` within a range.
pub fn parse_f32_range(val: &str, min: f32, max: f32) -> Option<f32> {
    let n: f32 = val.trim().parse().ok()?;
    (n.is_finite() && n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
