//! # tandem-settings
//!
//! Process-start configuration for the tandem bridge.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`BridgeSettings::default()`]
//! 2. **User file**: `~/.tandem/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `TANDEM_*` overrides (highest priority)
//!
//! Command-line flags are applied on top by the binary. None of these
//! values change at runtime except the generation section, which the
//! protocol's `update_settings` command copies into the live session.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings_from_path, settings_path};
pub use types::*;
