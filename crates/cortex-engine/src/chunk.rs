//! Chunking challenge: split a digit sequence into groups and reproduce it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use cortex_core::chunk::{ChunkRound, ChunkState, ChunkStyle, DIGITS};
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

const POINTS_PER_DIGIT: f64 = 3.0;
const LATENCY_WEIGHT: f64 = 2.0;
pub const MAX_ROUNDS: u32 = 50;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkStart {
    pub length: u32,
    pub max_chunk_size: u32,
    #[serde(default)]
    pub rounds: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkAnswer {
    pub chunks: Vec<Vec<u32>>,
    pub latency_secs: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChunkStarted {
    pub session_id: SessionId,
    pub round_number: u32,
    pub total_rounds: u32,
    pub max_chunk_size: u32,
    pub sequence: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChunkOutcome {
    pub correct: bool,
    pub style: ChunkStyle,
    pub score_gained: u32,
    pub total_score: u32,
    pub record: ChunkRound,
    pub next_sequence: Option<Vec<u32>>,
    pub game_over: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChunkStats {
    pub session_id: SessionId,
    pub total_rounds: usize,
    pub correct_rounds: usize,
    pub accuracy_percent: f64,
    pub mean_chunk_size: f64,
    pub dominant_style: ChunkStyle,
    pub final_score: u32,
}

pub fn sample_digits<R: Rng + ?Sized>(length: u32, rng: &mut R) -> Vec<u32> {
    rand::seq::index::sample(rng, DIGITS as usize, length.min(DIGITS) as usize)
        .into_iter()
        .map(|d| d as u32)
        .collect()
}

pub fn classify(chunks: &[Vec<u32>], max_chunk_size: u32) -> ChunkStyle {
    let sizes: Vec<f64> = chunks.iter().map(|c| c.len() as f64).collect();
    let largest = sizes.iter().copied().fold(0.0, f64::max);
    let limit = f64::from(max_chunk_size);
    if largest <= limit && mean(&sizes) <= limit {
        ChunkStyle::Balanced
    } else if largest > limit + 1.0 {
        ChunkStyle::Greedy
    } else {
        ChunkStyle::Scattered
    }
}

pub fn score_chunks(sequence: &[u32], chunks: &[Vec<u32>], latency_secs: f64) -> (bool, u32) {
    let correct = chunks.iter().flatten().eq(sequence.iter());
    let base = sequence.len() as f64 * POINTS_PER_DIGIT;
    let penalty = (latency_secs * LATENCY_WEIGHT).min(base);
    let score = if correct { (base - penalty).floor() as u32 } else { 0 };
    (correct, score)
}

pub fn validate_chunks(chunks: &[Vec<u32>]) -> Result<(), GameError> {
    if chunks.is_empty() {
        return Err(GameError::invalid("chunks must not be empty"));
    }
    if chunks.iter().any(Vec::is_empty) {
        return Err(GameError::invalid("every chunk must contain at least one digit"));
    }
    Ok(())
}

pub fn answer<R: Rng + ?Sized>(
    session: &MinigameSession,
    state: &ChunkState,
    ans: &ChunkAnswer,
    now: DateTime<Utc>,
    rng: &mut R,
) -> (MinigameSession, ChunkOutcome) {
    let (correct, score) = score_chunks(&state.sequence, &ans.chunks, ans.latency_secs);
    let style = classify(&ans.chunks, state.max_chunk_size);
    let record = ChunkRound {
        round_number: state.round_number,
        chunks: ans.chunks.clone(),
        correct,
        style,
        latency_secs: ans.latency_secs,
        score,
    };

    let mut next_state = state.clone();
    next_state.log.push(record.clone());
    let game_over = state.round_number >= state.total_rounds;

    let mut next = session.clone();
    next.score += score;
    let next_sequence = if game_over {
        next.ended_at = Some(now);
        None
    } else {
        next_state.round_number += 1;
        next_state.sequence = sample_digits(state.sequence.len() as u32, rng);
        Some(next_state.sequence.clone())
    };

    let outcome = ChunkOutcome {
        correct,
        style,
        score_gained: score,
        total_score: next.score,
        record,
        next_sequence,
        game_over,
    };
    next.state = MinigameState::Chunk(next_state);
    (next, outcome)
}

/// Most frequent style; ties go to the earlier of balanced, greedy, scattered.
fn dominant_style(log: &[ChunkRound]) -> ChunkStyle {
    let count = |style| log.iter().filter(|r| r.style == style).count();
    [ChunkStyle::Balanced, ChunkStyle::Greedy, ChunkStyle::Scattered]
        .into_iter()
        .rev()
        .max_by_key(|s| count(*s))
        .unwrap_or(ChunkStyle::Balanced)
}

pub fn stats(session: &MinigameSession, state: &ChunkState) -> Report<ChunkStats> {
    let log = &state.log;
    if log.is_empty() {
        return Report::insufficient("No rounds played.");
    }
    let correct = log.iter().filter(|r| r.correct).count();
    let sizes: Vec<f64> = log.iter().flat_map(|r| r.chunk_sizes()).map(|s| s as f64).collect();

    Report::Ready(ChunkStats {
        session_id: session.id.clone(),
        total_rounds: log.len(),
        correct_rounds: correct,
        accuracy_percent: percent(correct, log.len()),
        mean_chunk_size: round2(mean(&sizes)),
        dominant_style: dominant_style(log),
        final_score: session.score,
    })
}

pub struct ChunkService {
    repo: MinigameRepo,
    locks: SessionLocks,
    config: GameConfig,
    metrics: Arc<MetricsRecorder>,
}

impl ChunkService {
    pub fn new(db: Database, config: GameConfig, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            repo: MinigameRepo::new(db),
            locks: SessionLocks::new(),
            config,
            metrics,
        }
    }

    #[instrument(skip(self, params), fields(player_id = %owner))]
    pub fn start(&self, owner: &PlayerId, params: ChunkStart) -> Result<ChunkStarted, GameError> {
        if !(1..=DIGITS).contains(&params.length) {
            return Err(GameError::invalid(format!(
                "length must be within [1, {DIGITS}], got {}",
                params.length
            )));
        }
        if params.max_chunk_size == 0 {
            return Err(GameError::invalid("max_chunk_size must be at least 1"));
        }
        let total_rounds = params.rounds.unwrap_or(self.config.games.chunk_rounds);
        if !(1..=MAX_ROUNDS).contains(&total_rounds) {
            return Err(GameError::invalid(format!(
                "rounds must be within [1, {MAX_ROUNDS}], got {total_rounds}"
            )));
        }

        let sequence = sample_digits(params.length, &mut rand::thread_rng());
        let session = minigame::new_session(
            owner,
            MinigameState::Chunk(ChunkState {
                round_number: 1,
                total_rounds,
                max_chunk_size: params.max_chunk_size,
                sequence: sequence.clone(),
                log: Vec::new(),
            }),
        );
        self.repo.create(&session)?;

        self.metrics
            .counter_inc("sessions_started", &[("game", GameKind::Chunk.as_str())], 1);
        info!(session_id = %session.id, length = params.length, total_rounds, "chunk session started");
        Ok(ChunkStarted {
            session_id: session.id,
            round_number: 1,
            total_rounds,
            max_chunk_size: params.max_chunk_size,
            sequence,
        })
    }

    #[instrument(skip(self, ans), fields(session_id = %id, player_id = %owner))]
    pub fn submit(&self, id: &SessionId, owner: &PlayerId, ans: ChunkAnswer) -> Result<ChunkOutcome, GameError> {
        validate_chunks(&ans.chunks)?;
        validate_latency(ans.latency_secs, self.config.pattern.max_latency_secs)?;

        self.locks.with_lock(id, || {
            let session = minigame::load_owned(&self.repo, id, owner, GameKind::Chunk)?;
            if session.is_ended() {
                return Err(GameError::AlreadyEnded(id.to_string()));
            }
            let MinigameState::Chunk(state) = &session.state else {
                return Err(GameError::NotFound(format!("chunk session {id}")));
            };
            let (next, outcome) = answer(&session, state, &ans, Utc::now(), &mut rand::thread_rng());
            self.repo.save(&next)?;

            minigame::record_round(&self.metrics, GameKind::Chunk, ans.latency_secs, outcome.game_over);
            if outcome.game_over {
                info!(session_id = %id, total_score = next.score, "chunk session ended");
            }
            Ok(outcome)
        })
    }

    #[instrument(skip(self), fields(session_id = %id, player_id = %owner))]
    pub fn stats(&self, id: &SessionId, owner: &PlayerId) -> Result<Report<ChunkStats>, GameError> {
        let session = minigame::load_owned(&self.repo, id, owner, GameKind::Chunk)?;
        match &session.state {
            MinigameState::Chunk(state) => Ok(stats(&session, state)),
            _ => Err(GameError::NotFound(format!("chunk session {id}"))),
        }
    }
}
