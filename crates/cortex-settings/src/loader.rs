//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`CortexSettings::default()`]
//! 2. If `~/.cortex/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `CORTEX_*` environment overrides (highest priority)
//! 4. Validate the result

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::CortexSettings;

/// `~/.cortex`, or `/tmp/.cortex` when `HOME` is unset.
pub fn cortex_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".cortex")
}

pub fn settings_path() -> PathBuf {
    cortex_home().join("settings.json")
}

/// Resolve the configured database path against `~/.cortex`.
pub fn database_path(settings: &CortexSettings) -> PathBuf {
    let p = Path::new(&settings.database.path);
    if p.is_absolute() {
        p.to_owned()
    } else {
        cortex_home().join(p)
    }
}

pub fn load_settings() -> Result<CortexSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env overrides. A missing file
/// yields defaults; malformed JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<CortexSettings> {
    let mut settings = load_file(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn load_file(path: &Path) -> Result<CortexSettings> {
    let defaults = serde_json::to_value(CortexSettings::default())?;
    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };
    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// Objects merge per key, arrays and primitives are replaced, and nulls in
/// `source` leave the target untouched.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Invalid values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut CortexSettings) {
    if let Some(v) = read_env_string("CORTEX_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env("CORTEX_PORT", |s| parse_u32_range(s, 1, 65535)) {
        settings.server.port = v as u16;
    }
    if let Some(v) = read_env_string("CORTEX_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = read_env("CORTEX_LOG_LEVEL", parse_level) {
        settings.logging.level = v;
    }
    if let Some(v) = read_env("CORTEX_LOG_JSON", parse_bool) {
        settings.logging.json = v;
    }
    if let Some(v) = read_env("CORTEX_MAX_ROUNDS", |s| parse_u32_range(s, 1, 100)) {
        settings.games.max_rounds = v;
    }
    if let Some(v) = read_env("CORTEX_TIME_LIMIT_SECS", |s| parse_f64_range(s, 1.0, 30.0)) {
        settings.games.time_limit_secs = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Accepts (case-insensitive) `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

pub fn parse_f64_range(val: &str, min: f64, max: f64) -> Option<f64> {
    let n: f64 = val.trim().parse().ok()?;
    (n.is_finite() && n >= min && n <= max).then_some(n)
}

/// One of the `tracing` level names, lower-cased.
pub fn parse_level(val: &str) -> Option<String> {
    let level = val.trim().to_lowercase();
    matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error").then_some(level)
}

// ── Env var readers ─────────────────────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let val = std::env::var(name).ok()?;
    let result = parse(&val);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid env var, ignoring");
    }
    result
}
