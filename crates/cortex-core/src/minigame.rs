//! Envelope shared by the smaller games (dual n-back, Stroop, chunking).
//!
//! Their per-round state is small and game-specific, so it is persisted as a
//! typed serde document next to the common session columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chunk::ChunkState;
use crate::dual::DualState;
use crate::ids::{PlayerId, SessionId};
use crate::kind::GameKind;
use crate::stroop::StroopState;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MinigameState {
    Dual(DualState),
    Stroop(StroopState),
    Chunk(ChunkState),
}

impl MinigameState {
    pub fn kind(&self) -> GameKind {
        match self {
            Self::Dual(_) => GameKind::Dual,
            Self::Stroop(_) => GameKind::Stroop,
            Self::Chunk(_) => GameKind::Chunk,
        }
    }

    /// Number of answered rounds.
    pub fn rounds_played(&self) -> usize {
        match self {
            Self::Dual(s) => s.log.len(),
            Self::Stroop(s) => s.log.len(),
            Self::Chunk(s) => s.log.len(),
        }
    }

    /// Rounds judged fully correct.
    pub fn rounds_correct(&self) -> usize {
        match self {
            Self::Dual(s) => s
                .log
                .iter()
                .filter(|r| r.letter_correct() && r.position_correct())
                .count(),
            Self::Stroop(s) => s.log.iter().filter(|r| r.correct).count(),
            Self::Chunk(s) => s.log.iter().filter(|r| r.correct).count(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinigameSession {
    pub id: SessionId,
    pub owner: PlayerId,
    pub score: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub state: MinigameState,
}

impl MinigameSession {
    pub fn kind(&self) -> GameKind {
        self.state.kind()
    }

    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}
