//! Plumbing shared by the dual n-back, Stroop and chunking services.

use chrono::Utc;

use cortex_core::minigame::{MinigameSession, MinigameState};
use cortex_core::{GameKind, PlayerId, SessionId};
use cortex_store::MinigameRepo;
use cortex_telemetry::MetricsRecorder;

use crate::error::GameError;

pub fn new_session(owner: &PlayerId, state: MinigameState) -> MinigameSession {
    MinigameSession {
        id: SessionId::new(),
        owner: owner.clone(),
        score: 0,
        started_at: Utc::now(),
        ended_at: None,
        state,
    }
}

/// Load a session of the expected kind belonging to `owner`. Any mismatch is
/// reported as not found.
pub fn load_owned(
    repo: &MinigameRepo,
    id: &SessionId,
    owner: &PlayerId,
    kind: GameKind,
) -> Result<MinigameSession, GameError> {
    let session = repo.get(id)?;
    if &session.owner != owner || session.kind() != kind {
        return Err(GameError::NotFound(format!("{kind} session {id}")));
    }
    Ok(session)
}

pub fn record_round(metrics: &MetricsRecorder, kind: GameKind, latency_secs: f64, ended: bool) {
    let game = kind.as_str();
    metrics.counter_inc("rounds_judged", &[("game", game)], 1);
    metrics.histogram_observe("submission_latency_secs", &[("game", game)], latency_secs);
    if ended {
        metrics.counter_inc("sessions_ended", &[("game", game)], 1);
    }
}
