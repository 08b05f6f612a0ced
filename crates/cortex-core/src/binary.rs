use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{PlayerId, SessionId};
use crate::pattern::Winner;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryDifficulty {
    Easy,
    Normal,
    Hard,
}

impl BinaryDifficulty {
    /// Inclusive range the hidden target is drawn from.
    pub fn range(self) -> (u32, u32) {
        match self {
            Self::Easy => (1, 50),
            Self::Normal => (1, 100),
            Self::Hard => (1, 1000),
        }
    }
}

impl std::fmt::Display for BinaryDifficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Normal => write!(f, "normal"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

impl std::str::FromStr for BinaryDifficulty {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    TooLow,
    TooHigh,
    Correct,
}

impl Feedback {
    pub fn for_guess(guess: u32, target: u32) -> Self {
        match guess.cmp(&target) {
            std::cmp::Ordering::Less => Self::TooLow,
            std::cmp::Ordering::Greater => Self::TooHigh,
            std::cmp::Ordering::Equal => Self::Correct,
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLow => write!(f, "too_low"),
            Self::TooHigh => write!(f, "too_high"),
            Self::Correct => write!(f, "correct"),
        }
    }
}

impl std::str::FromStr for Feedback {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "too_low" => Ok(Self::TooLow),
            "too_high" => Ok(Self::TooHigh),
            "correct" => Ok(Self::Correct),
            other => Err(format!("unknown feedback: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryTurn {
    /// 1-based, counts both player and house guesses.
    pub turn: u32,
    pub guesser: Winner,
    pub guess: u32,
    pub feedback: Feedback,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinaryDuel {
    pub id: SessionId,
    pub owner: PlayerId,
    pub difficulty: BinaryDifficulty,
    pub range_min: u32,
    pub range_max: u32,
    pub target: u32,
    pub winner: Option<Winner>,
    pub turns: Vec<BinaryTurn>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl BinaryDuel {
    pub fn is_ended(&self) -> bool {
        self.winner.is_some()
    }

    pub fn guesses_by(&self, guesser: Winner) -> Vec<u32> {
        self.turns
            .iter()
            .filter(|t| t.guesser == guesser)
            .map(|t| t.guess)
            .collect()
    }
}
