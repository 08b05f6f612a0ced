//! # cortex-settings
//!
//! Layered configuration for the game server:
//! 1. **Compiled defaults** ([`CortexSettings::default()`])
//! 2. **User file** `~/.cortex/settings.json`, deep-merged over defaults
//! 3. **Environment** `CORTEX_*` overrides
//!
//! ```no_run
//! let settings = cortex_settings::get_settings();
//! println!("listening on {}:{}", settings.server.host, settings.server.port);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{database_path, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<CortexSettings> = OnceLock::new();

/// Global settings, loaded on first access. Falls back to compiled defaults
/// when loading fails.
pub fn get_settings() -> &'static CortexSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            CortexSettings::default()
        })
    })
}

/// Install settings loaded elsewhere. Returns them back if already set.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: CortexSettings) -> std::result::Result<(), CortexSettings> {
    SETTINGS.set(settings)
}
