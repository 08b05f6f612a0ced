//! Pattern memory matrix: the adaptive round state machine and its service.

pub mod analytics;
pub mod difficulty;
pub mod judge;
pub mod machine;
pub mod projection;
pub mod revive;
pub mod score;
pub mod streak;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use cortex_core::pattern::{PatternSession, RoundState};
use cortex_core::{GameKind, PlayerId, SessionId};
use cortex_store::{Database, PatternRepo};
use cortex_telemetry::MetricsRecorder;

use self::analytics::{BrainProfile, PatternProfile, PatternProgress, PatternStats};
pub use self::machine::{NextRoundView, RoundResult, Submission};
use crate::error::GameError;
use crate::locks::SessionLocks;
use crate::stats::Report;
use crate::tunables::GameConfig;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StartParams {
    pub grid_size: Option<u32>,
}

pub struct PatternService {
    repo: PatternRepo,
    locks: SessionLocks,
    config: GameConfig,
    metrics: Arc<MetricsRecorder>,
}

impl PatternService {
    pub fn new(db: Database, config: GameConfig, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            repo: PatternRepo::new(db),
            locks: SessionLocks::new(),
            config,
            metrics,
        }
    }

    #[instrument(skip(self, params), fields(player_id = %owner))]
    pub fn start(&self, owner: &PlayerId, params: StartParams) -> Result<PatternSession, GameError> {
        let games = &self.config.games;
        let grid_size = params.grid_size.unwrap_or(games.default_grid_size);
        if grid_size < games.min_grid_size || grid_size > games.max_start_grid_size {
            return Err(GameError::invalid(format!(
                "grid_size must be within [{}, {}], got {grid_size}",
                games.min_grid_size, games.max_start_grid_size
            )));
        }

        let target_length = self.config.pattern.initial_target_length;
        let expected_sequence = difficulty::sample_sequence(grid_size, target_length, &mut rand::thread_rng());

        let session = PatternSession {
            id: SessionId::new(),
            owner: owner.clone(),
            cumulative_score: 0,
            started_at: Utc::now(),
            ended_at: None,
            winner: None,
            round: RoundState {
                round_number: 1,
                grid_size,
                target_length,
                expected_sequence,
                correct_streak: 0,
                max_streak: 0,
                revive_used: false,
                round_log: Vec::new(),
                time_limit_secs: games.time_limit_secs,
                max_rounds: games.max_rounds,
            },
        };
        self.repo.create(&session)?;

        self.metrics
            .counter_inc("sessions_started", &[("game", GameKind::Pattern.as_str())], 1);
        info!(session_id = %session.id, grid_size, "pattern session started");
        Ok(session)
    }

    /// Judge one submission: one load, one transition, at most one save,
    /// serialised per session.
    #[instrument(skip(self, sub), fields(session_id = %id, player_id = %owner))]
    pub fn submit(&self, id: &SessionId, owner: &PlayerId, sub: Submission) -> Result<RoundResult, GameError> {
        machine::validate_submission(&sub, &self.config.pattern)?;

        self.locks.with_lock(id, || {
            let session = self.load_owned(id, owner)?;
            if session.is_ended() {
                return Err(GameError::AlreadyEnded(id.to_string()));
            }

            let (next, result) =
                machine::transition(&session, &sub, &self.config.pattern, Utc::now(), &mut rand::thread_rng());
            self.repo.save(&next)?;

            self.record_metrics(&next, &result, sub.latency_secs);
            debug!(
                round = session.round.round_number,
                result = result.kind(),
                total_score = next.cumulative_score,
                "submission judged"
            );
            Ok(result)
        })
    }

    #[instrument(skip(self), fields(session_id = %id, player_id = %owner))]
    pub fn stats(&self, id: &SessionId, owner: &PlayerId) -> Result<Report<PatternStats>, GameError> {
        Ok(analytics::stats(&self.load_owned(id, owner)?))
    }

    #[instrument(skip(self), fields(session_id = %id, player_id = %owner))]
    pub fn progress(&self, id: &SessionId, owner: &PlayerId) -> Result<PatternProgress, GameError> {
        analytics::progress(&self.load_owned(id, owner)?)
    }

    #[instrument(skip(self), fields(session_id = %id, player_id = %owner))]
    pub fn profile(&self, id: &SessionId, owner: &PlayerId) -> Result<Report<PatternProfile>, GameError> {
        Ok(analytics::profile(&self.load_owned(id, owner)?))
    }

    /// Lifetime profile over every round the player has logged, including
    /// sessions still in progress.
    #[instrument(skip(self), fields(player_id = %owner))]
    pub fn brain_profile(&self, owner: &PlayerId) -> Result<Report<BrainProfile>, GameError> {
        let sessions = self.repo.list_by_owner(owner)?;
        Ok(analytics::brain_profile(owner, &sessions))
    }

    /// Load a session, treating another player's session as missing.
    fn load_owned(&self, id: &SessionId, owner: &PlayerId) -> Result<PatternSession, GameError> {
        let session = self.repo.get(id)?;
        if !session.is_owned_by(owner) {
            return Err(GameError::NotFound(format!("pattern session {id}")));
        }
        Ok(session)
    }

    fn record_metrics(&self, session: &PatternSession, result: &RoundResult, latency_secs: f64) {
        let game = GameKind::Pattern.as_str();
        self.metrics
            .histogram_observe("submission_latency_secs", &[("game", game)], latency_secs);
        match result {
            RoundResult::Retry { .. } => {
                self.metrics.counter_inc("revives_granted", &[("game", game)], 1);
                info!(session_id = %session.id, round = session.round.round_number, "revive granted");
            }
            RoundResult::Advance { record, .. } | RoundResult::Ended { record, .. } => {
                self.metrics.counter_inc(
                    "rounds_judged",
                    &[("game", game), ("outcome", record.outcome.as_str())],
                    1,
                );
            }
        }
        if let RoundResult::Ended { winner, total_score, .. } = result {
            let winner = winner.to_string();
            self.metrics
                .counter_inc("sessions_ended", &[("game", game), ("winner", winner.as_str())], 1);
            info!(session_id = %session.id, %winner, total_score, "pattern session ended");
        }
    }
}
