//! Settings schema. Every section is camelCase on disk and falls back to
//! its defaults when omitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cortex_core::{GameConfig, GameDefaults, PatternTunables};

use crate::errors::{Result, SettingsError};
use crate::loader::parse_level;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CortexSettings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub pattern: PatternTunables,
    pub games: GameDefaults,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// SQLite file, relative to `~/.cortex` unless absolute.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "cortex.db".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    /// JSON lines when true, human-readable otherwise.
    pub json: bool,
    /// Per-module overrides, e.g. `{"cortex_store": "debug"}`.
    pub module_levels: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            module_levels: BTreeMap::new(),
        }
    }
}

impl LoggingSettings {
    pub fn log_level(&self) -> tracing::Level {
        self.level.parse().unwrap_or(tracing::Level::INFO)
    }

    /// Module overrides as tracing levels. Entries that fail to parse are
    /// skipped; [`CortexSettings::validate`] rejects them up front.
    pub fn module_directives(&self) -> Vec<(String, tracing::Level)> {
        self.module_levels
            .iter()
            .filter_map(|(module, level)| Some((module.clone(), level.parse().ok()?)))
            .collect()
    }
}

impl CortexSettings {
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            pattern: self.pattern.clone(),
            games: self.games.clone(),
        }
    }

    /// Reject combinations the game services cannot run with.
    pub fn validate(&self) -> Result<()> {
        let g = &self.games;
        let p = &self.pattern;
        let checks = [
            (g.time_limit_secs > 0.0 && g.time_limit_secs.is_finite(), "games.timeLimitSecs must be positive"),
            (g.max_rounds >= 1, "games.maxRounds must be at least 1"),
            (g.min_grid_size >= 1, "games.minGridSize must be at least 1"),
            (
                g.min_grid_size <= g.default_grid_size && g.default_grid_size <= g.max_start_grid_size,
                "games.defaultGridSize must lie within [minGridSize, maxStartGridSize]",
            ),
            (p.initial_target_length >= 1, "pattern.initialTargetLength must be at least 1"),
            (p.multiplier_streak_step >= 1, "pattern.multiplierStreakStep must be at least 1"),
            (p.max_latency_secs > 0.0, "pattern.maxLatencySecs must be positive"),
            (g.stroop_rounds >= 1 && g.chunk_rounds >= 1 && g.dual_rounds >= 1, "game round counts must be at least 1"),
        ];
        if let Some((_, msg)) = checks.into_iter().find(|(ok, _)| !ok) {
            return Err(SettingsError::InvalidValue(msg.to_string()));
        }
        if parse_level(&self.logging.level).is_none() {
            return Err(SettingsError::InvalidValue(format!(
                "logging.level {:?} is not a tracing level",
                self.logging.level
            )));
        }
        for (module, level) in &self.logging.module_levels {
            if module.trim().is_empty() || parse_level(level).is_none() {
                return Err(SettingsError::InvalidValue(format!(
                    "logging.moduleLevels entry {module:?}: {level:?} is invalid"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = CortexSettings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.pattern.points_per_cell, 5);
        assert_eq!(s.games.max_rounds, 10);
        assert_eq!(s.game_config(), GameConfig::default());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(CortexSettings::default()).unwrap();
        assert_eq!(json["games"]["timeLimitSecs"], 5.0);
        assert_eq!(json["pattern"]["reviveWindow"], 5);
        assert_eq!(json["logging"]["level"], "info");
    }

    #[test]
    fn inconsistent_grid_rejected() {
        let mut s = CortexSettings::default();
        s.games.default_grid_size = 9;
        assert!(matches!(s.validate(), Err(SettingsError::InvalidValue(_))));
    }

    #[test]
    fn zero_rounds_rejected() {
        let mut s = CortexSettings::default();
        s.games.max_rounds = 0;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("maxRounds"));
    }

    #[test]
    fn module_levels_become_directives() {
        let json = serde_json::json!({
            "logging": {"moduleLevels": {"cortex_store": "DEBUG", "tower_http": "warn"}}
        });
        let s: CortexSettings = serde_json::from_value(json).unwrap();
        assert!(s.validate().is_ok());
        assert_eq!(
            s.logging.module_directives(),
            vec![
                ("cortex_store".to_string(), tracing::Level::DEBUG),
                ("tower_http".to_string(), tracing::Level::WARN),
            ]
        );
        assert_eq!(serde_json::to_value(&s).unwrap()["logging"]["moduleLevels"]["tower_http"], "warn");
    }

    #[test]
    fn bad_module_level_rejected() {
        let mut s = CortexSettings::default();
        s.logging.module_levels.insert("cortex_store".into(), "loud".into());
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("moduleLevels"));
    }
}
