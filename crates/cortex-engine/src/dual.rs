//! Dual n-back: a stream of (cell, letter) stimuli; for each one the player
//! reports whether either channel repeats the stimulus `n` steps back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use cortex_core::dual::{DualRound, DualState, Stimulus, GRID_CELLS, LETTERS};
use cortex_core::minigame::{MinigameSession, MinigameState};
use cortex_core::{GameKind, PlayerId, SessionId};
use cortex_store::{Database, MinigameRepo};
use cortex_telemetry::MetricsRecorder;

use crate::error::GameError;
use crate::locks::SessionLocks;
use crate::minigame;
use crate::pattern::machine::validate_latency;
use crate::stats::{mean, percent, round2, Report};
use crate::tunables::GameConfig;

pub const MAX_N: u32 = 9;
const POINTS_PER_CHANNEL: u32 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DualAnswer {
    pub letter_match: bool,
    pub position_match: bool,
    pub latency_secs: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DualCue {
    pub round_number: u32,
    pub grid_pos: u32,
    pub letter: char,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DualStart {
    pub session_id: SessionId,
    pub n: u32,
    pub first: DualCue,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DualOutcome {
    pub letter_truth: bool,
    pub position_truth: bool,
    pub score_gained: u32,
    pub total_score: u32,
    pub record: DualRound,
    pub next: Option<DualCue>,
    pub game_over: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DualStats {
    pub session_id: SessionId,
    pub total_rounds: usize,
    pub correct_letter: usize,
    pub correct_position: usize,
    pub accuracy_percent: f64,
    pub average_latency_secs: f64,
    pub final_score: u32,
}

pub fn generate_stimuli<R: Rng + ?Sized>(count: u32, rng: &mut R) -> Vec<Stimulus> {
    (0..count)
        .map(|_| Stimulus {
            grid_pos: rng.gen_range(0..GRID_CELLS),
            letter: LETTERS[rng.gen_range(0..LETTERS.len())],
        })
        .collect()
}

fn cue(state: &DualState, index: usize) -> Option<DualCue> {
    state.stimuli.get(index).map(|s| DualCue {
        round_number: index as u32 + 1,
        grid_pos: s.grid_pos,
        letter: s.letter,
    })
}

/// Whether the stimulus at `index` repeats the one `n` back, per channel.
/// Both are false while fewer than `n` stimuli precede it.
pub fn truth_at(stimuli: &[Stimulus], index: usize, n: u32) -> (bool, bool) {
    let Some(back) = index.checked_sub(n as usize) else {
        return (false, false);
    };
    match (stimuli.get(back), stimuli.get(index)) {
        (Some(prev), Some(cur)) => (prev.letter == cur.letter, prev.grid_pos == cur.grid_pos),
        _ => (false, false),
    }
}

/// Answer the current stimulus. Returns `None` when no stimulus remains.
pub fn answer(
    session: &MinigameSession,
    state: &DualState,
    ans: &DualAnswer,
    now: DateTime<Utc>,
) -> Option<(MinigameSession, DualOutcome)> {
    let stimulus = state.current_stimulus()?;
    let (letter_truth, position_truth) = truth_at(&state.stimuli, state.current, state.n);

    let mut record = DualRound {
        round_number: state.current as u32 + 1,
        stimulus,
        latency_secs: ans.latency_secs,
        letter_match: ans.letter_match,
        position_match: ans.position_match,
        letter_truth,
        position_truth,
        score: 0,
    };
    record.score = POINTS_PER_CHANNEL * (u32::from(record.letter_correct()) + u32::from(record.position_correct()));

    let mut next_state = state.clone();
    next_state.current += 1;
    next_state.log.push(record.clone());

    let game_over = next_state.current >= next_state.stimuli.len();
    let mut next = session.clone();
    next.score += record.score;
    if game_over {
        next.ended_at = Some(now);
    }

    let outcome = DualOutcome {
        letter_truth,
        position_truth,
        score_gained: record.score,
        total_score: next.score,
        next: cue(&next_state, next_state.current),
        record,
        game_over,
    };
    next.state = MinigameState::Dual(next_state);
    Some((next, outcome))
}

pub fn stats(session: &MinigameSession, state: &DualState) -> Report<DualStats> {
    let log = &state.log;
    if log.is_empty() {
        return Report::insufficient("No rounds played.");
    }
    let correct_letter = log.iter().filter(|r| r.letter_correct()).count();
    let correct_position = log.iter().filter(|r| r.position_correct()).count();
    let times: Vec<f64> = log.iter().map(|r| r.latency_secs).collect();

    Report::Ready(DualStats {
        session_id: session.id.clone(),
        total_rounds: log.len(),
        correct_letter,
        correct_position,
        accuracy_percent: percent(correct_letter + correct_position, log.len() * 2),
        average_latency_secs: round2(mean(&times)),
        final_score: session.score,
    })
}

pub struct DualService {
    repo: MinigameRepo,
    locks: SessionLocks,
    config: GameConfig,
    metrics: Arc<MetricsRecorder>,
}

impl DualService {
    pub fn new(db: Database, config: GameConfig, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            repo: MinigameRepo::new(db),
            locks: SessionLocks::new(),
            config,
            metrics,
        }
    }

    #[instrument(skip(self), fields(player_id = %owner))]
    pub fn start(&self, owner: &PlayerId, n: u32) -> Result<DualStart, GameError> {
        if !(1..=MAX_N).contains(&n) {
            return Err(GameError::invalid(format!("n must be within [1, {MAX_N}], got {n}")));
        }
        let rounds = self.config.games.dual_rounds.max(1);
        let state = DualState {
            n,
            stimuli: generate_stimuli(rounds, &mut rand::thread_rng()),
            current: 0,
            log: Vec::new(),
        };
        let first = cue(&state, 0).ok_or_else(|| GameError::invalid("no stimuli generated"))?;
        let session = minigame::new_session(owner, MinigameState::Dual(state));
        self.repo.create(&session)?;

        self.metrics
            .counter_inc("sessions_started", &[("game", GameKind::Dual.as_str())], 1);
        info!(session_id = %session.id, n, rounds, "dual n-back started");
        Ok(DualStart {
            session_id: session.id,
            n,
            first,
        })
    }

    #[instrument(skip(self, ans), fields(session_id = %id, player_id = %owner))]
    pub fn submit(&self, id: &SessionId, owner: &PlayerId, ans: DualAnswer) -> Result<DualOutcome, GameError> {
        validate_latency(ans.latency_secs, self.config.pattern.max_latency_secs)?;

        self.locks.with_lock(id, || {
            let session = minigame::load_owned(&self.repo, id, owner, GameKind::Dual)?;
            let MinigameState::Dual(state) = &session.state else {
                return Err(GameError::NotFound(format!("dual session {id}")));
            };
            if session.is_ended() {
                return Err(GameError::AlreadyEnded(id.to_string()));
            }
            let (next, outcome) = answer(&session, state, &ans, Utc::now())
                .ok_or_else(|| GameError::AlreadyEnded(id.to_string()))?;
            self.repo.save(&next)?;

            minigame::record_round(&self.metrics, GameKind::Dual, ans.latency_secs, outcome.game_over);
            if outcome.game_over {
                info!(session_id = %id, total_score = next.score, "dual n-back ended");
            }
            Ok(outcome)
        })
    }

    #[instrument(skip(self), fields(session_id = %id, player_id = %owner))]
    pub fn stats(&self, id: &SessionId, owner: &PlayerId) -> Result<Report<DualStats>, GameError> {
        let session = minigame::load_owned(&self.repo, id, owner, GameKind::Dual)?;
        match &session.state {
            MinigameState::Dual(state) => Ok(stats(&session, state)),
            _ => Err(GameError::NotFound(format!("dual session {id}"))),
        }
    }
}
