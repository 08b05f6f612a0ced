//! Data model for the pattern memory matrix game.
//!
//! A [`PatternSession`] owns a [`RoundState`] that is replaced wholesale on
//! every submission. Completed rounds are appended to `round_log`; revived
//! retries never are.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{PlayerId, SessionId};

/// Judged result of one submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Timeout,
    WrongOrder,
    /// Timed out and wrong order at the same time.
    Mixed,
}

impl Outcome {
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Timeout => "timeout",
            Self::WrongOrder => "wrong_order",
            Self::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "correct" => Ok(Self::Correct),
            "timeout" => Ok(Self::Timeout),
            "wrong_order" => Ok(Self::WrongOrder),
            "mixed" => Ok(Self::Mixed),
            other => Err(format!("unknown outcome: {other}")),
        }
    }
}

/// Who won a finished session. Also names the guesser in the binary duel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Player,
    House,
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::House => write!(f, "house"),
        }
    }
}

impl std::str::FromStr for Winner {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "player" => Ok(Self::Player),
            "house" => Ok(Self::House),
            other => Err(format!("unknown winner: {other}")),
        }
    }
}

/// Lifecycle position of a session between submissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    AwaitingRound,
    Ended,
}

/// One completed (advanced) round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_number: u32,
    pub correct: bool,
    pub outcome: Outcome,
    pub grid_size: u32,
    pub target_length: u32,
    pub latency_secs: f64,
    pub base_score: u32,
    pub time_penalty: f64,
    pub bonus: u32,
    pub multiplier: f64,
    pub score: u32,
    pub correct_streak_at_time: u32,
    pub max_streak_so_far: u32,
    pub projected_final_score: u32,
}

/// Per-round working set, owned by the state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// 1-based.
    pub round_number: u32,
    pub grid_size: u32,
    pub target_length: u32,
    /// Distinct cell indices in `[0, grid_size²)`, in the order they must be reproduced.
    pub expected_sequence: Vec<u32>,
    pub correct_streak: u32,
    pub max_streak: u32,
    /// Flips false → true at most once per session.
    pub revive_used: bool,
    pub round_log: Vec<RoundRecord>,
    pub time_limit_secs: f64,
    pub max_rounds: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternSession {
    pub id: SessionId,
    pub owner: PlayerId,
    pub cumulative_score: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub winner: Option<Winner>,
    pub round: RoundState,
}

impl PatternSession {
    pub fn status(&self) -> SessionStatus {
        if self.ended_at.is_some() {
            SessionStatus::Ended
        } else {
            SessionStatus::AwaitingRound
        }
    }

    pub fn is_ended(&self) -> bool {
        self.status() == SessionStatus::Ended
    }

    pub fn is_owned_by(&self, player: &PlayerId) -> bool {
        &self.owner == player
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PatternSession {
        PatternSession {
            id: SessionId::new(),
            owner: PlayerId::from_raw("alice"),
            cumulative_score: 0,
            started_at: Utc::now(),
            ended_at: None,
            winner: None,
            round: RoundState {
                round_number: 1,
                grid_size: 3,
                target_length: 3,
                expected_sequence: vec![0, 4, 8],
                correct_streak: 0,
                max_streak: 0,
                revive_used: false,
                round_log: Vec::new(),
                time_limit_secs: 5.0,
                max_rounds: 10,
            },
        }
    }

    #[test]
    fn status_follows_ended_at() {
        let mut s = session();
        assert_eq!(s.status(), SessionStatus::AwaitingRound);
        s.ended_at = Some(Utc::now());
        assert!(s.is_ended());
    }

    #[test]
    fn ownership_check() {
        let s = session();
        assert!(s.is_owned_by(&PlayerId::from_raw("alice")));
        assert!(!s.is_owned_by(&PlayerId::from_raw("bob")));
    }

    #[test]
    fn outcome_strings_roundtrip_through_from_str() {
        for o in [Outcome::Correct, Outcome::Timeout, Outcome::WrongOrder, Outcome::Mixed] {
            assert_eq!(o.as_str().parse::<Outcome>().unwrap(), o);
        }
        assert!("none".parse::<Outcome>().is_err());
    }

    #[test]
    fn winner_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Winner::House).unwrap(), "\"house\"");
        assert_eq!("player".parse::<Winner>().unwrap(), Winner::Player);
    }
}
