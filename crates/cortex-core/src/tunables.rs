//! Named constants behind the pattern scoring and difficulty rules, plus
//! per-game session defaults. Both are loaded from settings and consumed by
//! the game engine.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternTunables {
    /// Base points per cell of target length.
    pub points_per_cell: u32,
    /// Points lost per second of latency.
    pub latency_weight: f64,
    pub streak_bonus: u32,
    pub streak_bonus_min_streak: u32,
    /// Bonus requires latency at or below this fraction of the time limit.
    pub streak_bonus_latency_ratio: f64,
    /// Multiplier grows once per this many consecutive correct rounds.
    pub multiplier_streak_step: u32,
    pub multiplier_increment: f64,
    /// Finishing within this fraction of the time limit adds an extra length step.
    pub fast_finish_ratio: f64,
    pub grid_growth_min_streak: u32,
    pub max_grid_size: u32,
    /// Number of trailing correct rounds required for a revive. Zero disables revives.
    pub revive_window: usize,
    pub initial_target_length: u32,
    pub max_latency_secs: f64,
}

impl Default for PatternTunables {
    fn default() -> Self {
        Self {
            points_per_cell: 5,
            latency_weight: 2.0,
            streak_bonus: 10,
            streak_bonus_min_streak: 2,
            streak_bonus_latency_ratio: 0.75,
            multiplier_streak_step: 3,
            multiplier_increment: 0.1,
            fast_finish_ratio: 0.6,
            grid_growth_min_streak: 3,
            max_grid_size: 6,
            revive_window: 5,
            initial_target_length: 3,
            max_latency_secs: 30.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameDefaults {
    pub time_limit_secs: f64,
    pub max_rounds: u32,
    pub default_grid_size: u32,
    pub min_grid_size: u32,
    pub max_start_grid_size: u32,
    pub dual_rounds: u32,
    pub stroop_rounds: u32,
    pub chunk_rounds: u32,
}

impl Default for GameDefaults {
    fn default() -> Self {
        Self {
            time_limit_secs: 5.0,
            max_rounds: 10,
            default_grid_size: 3,
            min_grid_size: 2,
            max_start_grid_size: 8,
            dual_rounds: 20,
            stroop_rounds: 5,
            chunk_rounds: 5,
        }
    }
}

/// Everything a game service needs from configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub pattern: PatternTunables,
    pub games: GameDefaults,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_other_defaults() {
        let t: PatternTunables = serde_json::from_str(r#"{"streakBonus": 20}"#).unwrap();
        assert_eq!(t.streak_bonus, 20);
        assert_eq!(t.points_per_cell, 5);
        assert_eq!(t.max_grid_size, 6);
    }

    #[test]
    fn defaults_serialize_camel_case() {
        let json = serde_json::to_value(GameDefaults::default()).unwrap();
        assert_eq!(json["maxRounds"], 10);
        assert_eq!(json["timeLimitSecs"], 5.0);
    }
}
