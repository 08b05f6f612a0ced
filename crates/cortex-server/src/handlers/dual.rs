use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use cortex_core::SessionId;
use cortex_engine::dual::{DualAnswer, DualOutcome, DualStart, DualStats};
use cortex_engine::Report;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, Player, SessionQuery};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub n: u32,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub session_id: SessionId,
    pub letter_match: bool,
    pub position_match: bool,
    pub latency_secs: f64,
}

pub async fn start(
    State(state): State<AppState>,
    Player(player): Player,
    ApiJson(req): ApiJson<StartRequest>,
) -> ApiResult<DualStart> {
    Ok(Json(state.engine.dual.start(&player, req.n)?))
}

pub async fn submit(
    State(state): State<AppState>,
    Player(player): Player,
    ApiJson(req): ApiJson<SubmitRequest>,
) -> ApiResult<DualOutcome> {
    let ans = DualAnswer {
        letter_match: req.letter_match,
        position_match: req.position_match,
        latency_secs: req.latency_secs,
    };
    Ok(Json(state.engine.dual.submit(&req.session_id, &player, ans)?))
}

pub async fn stats(
    State(state): State<AppState>,
    Player(player): Player,
    ApiQuery(q): ApiQuery<SessionQuery>,
) -> ApiResult<Report<DualStats>> {
    Ok(Json(state.engine.dual.stats(&q.session_id, &player)?))
}
