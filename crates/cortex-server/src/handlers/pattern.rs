use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use cortex_core::pattern::PatternSession;
use cortex_core::SessionId;
use cortex_engine::pattern::analytics::{BrainProfile, PatternProfile, PatternProgress, PatternStats};
use cortex_engine::pattern::{RoundResult, StartParams, Submission};
use cortex_engine::Report;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, Player, SessionQuery};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub session_id: SessionId,
    pub round_number: u32,
    pub grid_size: u32,
    pub sequence: Vec<u32>,
    pub time_limit_secs: f64,
    pub max_rounds: u32,
}

impl From<PatternSession> for StartResponse {
    fn from(s: PatternSession) -> Self {
        Self {
            session_id: s.id,
            round_number: s.round.round_number,
            grid_size: s.round.grid_size,
            sequence: s.round.expected_sequence,
            time_limit_secs: s.round.time_limit_secs,
            max_rounds: s.round.max_rounds,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub session_id: SessionId,
    pub answer: Vec<u32>,
    pub latency_secs: f64,
}

pub async fn start(
    State(state): State<AppState>,
    Player(player): Player,
    ApiJson(params): ApiJson<StartParams>,
) -> ApiResult<StartResponse> {
    let session = state.engine.pattern.start(&player, params)?;
    Ok(Json(session.into()))
}

pub async fn submit(
    State(state): State<AppState>,
    Player(player): Player,
    ApiJson(req): ApiJson<SubmitRequest>,
) -> ApiResult<RoundResult> {
    let sub = Submission {
        answer: req.answer,
        latency_secs: req.latency_secs,
    };
    Ok(Json(state.engine.pattern.submit(&req.session_id, &player, sub)?))
}

pub async fn stats(
    State(state): State<AppState>,
    Player(player): Player,
    ApiQuery(q): ApiQuery<SessionQuery>,
) -> ApiResult<Report<PatternStats>> {
    Ok(Json(state.engine.pattern.stats(&q.session_id, &player)?))
}

pub async fn progress(
    State(state): State<AppState>,
    Player(player): Player,
    ApiQuery(q): ApiQuery<SessionQuery>,
) -> ApiResult<PatternProgress> {
    Ok(Json(state.engine.pattern.progress(&q.session_id, &player)?))
}

pub async fn profile(
    State(state): State<AppState>,
    Player(player): Player,
    ApiQuery(q): ApiQuery<SessionQuery>,
) -> ApiResult<Report<PatternProfile>> {
    Ok(Json(state.engine.pattern.profile(&q.session_id, &player)?))
}

pub async fn brain_profile(
    State(state): State<AppState>,
    Player(player): Player,
) -> ApiResult<Report<BrainProfile>> {
    Ok(Json(state.engine.pattern.brain_profile(&player)?))
}
