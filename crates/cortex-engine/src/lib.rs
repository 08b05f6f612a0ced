//! # cortex-engine
//!
//! Game rules and the services that drive them.
//!
//! - **Pattern matrix**: judge, score, streak, revive, difficulty and projection
//!   steps composed into a pure round transition, plus read-only analytics
//! - **Binary duel**: player versus a bisecting house
//! - **Dual n-back**, **Stroop** and **chunking** mini-games
//! - **Progress**: per-player history of finished sessions
//!
//! Every service performs one load and at most one save per submission,
//! serialised per session by [`locks::SessionLocks`].

#![deny(unsafe_code)]

pub mod binary;
pub mod chunk;
pub mod dual;
pub mod error;
pub mod locks;
pub mod minigame;
pub mod pattern;
pub mod progress;
pub mod stats;
pub mod stroop;

use std::sync::Arc;

use cortex_store::Database;
use cortex_telemetry::MetricsRecorder;

pub use binary::BinaryService;
pub use chunk::ChunkService;
pub use dual::DualService;
pub use error::GameError;
pub use pattern::PatternService;
pub use progress::ProgressService;
pub use stats::Report;
pub use stroop::StroopService;
pub use cortex_core::tunables::{self, GameConfig, GameDefaults, PatternTunables};

/// All game services over one database.
pub struct GameEngine {
    pub pattern: PatternService,
    pub binary: BinaryService,
    pub dual: DualService,
    pub stroop: StroopService,
    pub chunk: ChunkService,
    pub progress: ProgressService,
}

impl GameEngine {
    pub fn new(db: Database, config: GameConfig, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            pattern: PatternService::new(db.clone(), config.clone(), Arc::clone(&metrics)),
            binary: BinaryService::new(db.clone(), Arc::clone(&metrics)),
            dual: DualService::new(db.clone(), config.clone(), Arc::clone(&metrics)),
            stroop: StroopService::new(db.clone(), config.clone(), Arc::clone(&metrics)),
            chunk: ChunkService::new(db.clone(), config, metrics),
            progress: ProgressService::new(db),
        }
    }
}
