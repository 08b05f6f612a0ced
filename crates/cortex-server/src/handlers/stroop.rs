use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use cortex_core::SessionId;
use cortex_engine::stroop::{StroopAnswer, StroopOutcome, StroopStart, StroopStarted, StroopStats};
use cortex_engine::Report;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, Player, SessionQuery};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub session_id: SessionId,
    pub response: String,
    pub latency_secs: f64,
}

pub async fn start(
    State(state): State<AppState>,
    Player(player): Player,
    ApiJson(params): ApiJson<StroopStart>,
) -> ApiResult<StroopStarted> {
    Ok(Json(state.engine.stroop.start(&player, params)?))
}

pub async fn submit(
    State(state): State<AppState>,
    Player(player): Player,
    ApiJson(req): ApiJson<SubmitRequest>,
) -> ApiResult<StroopOutcome> {
    let ans = StroopAnswer {
        response: req.response,
        latency_secs: req.latency_secs,
    };
    Ok(Json(state.engine.stroop.submit(&req.session_id, &player, ans)?))
}

pub async fn stats(
    State(state): State<AppState>,
    Player(player): Player,
    ApiQuery(q): ApiQuery<SessionQuery>,
) -> ApiResult<Report<StroopStats>> {
    Ok(Json(state.engine.stroop.stats(&q.session_id, &player)?))
}
