use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use cortex_core::SessionId;
use cortex_engine::chunk::{ChunkAnswer, ChunkOutcome, ChunkStart, ChunkStarted, ChunkStats};
use cortex_engine::Report;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, Player, SessionQuery};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub session_id: SessionId,
    pub chunks: Vec<Vec<u32>>,
    pub latency_secs: f64,
}

pub async fn start(
    State(state): State<AppState>,
    Player(player): Player,
    ApiJson(params): ApiJson<ChunkStart>,
) -> ApiResult<ChunkStarted> {
    Ok(Json(state.engine.chunk.start(&player, params)?))
}

pub async fn submit(
    State(state): State<AppState>,
    Player(player): Player,
    ApiJson(req): ApiJson<SubmitRequest>,
) -> ApiResult<ChunkOutcome> {
    let ans = ChunkAnswer {
        chunks: req.chunks,
        latency_secs: req.latency_secs,
    };
    Ok(Json(state.engine.chunk.submit(&req.session_id, &player, ans)?))
}

pub async fn stats(
    State(state): State<AppState>,
    Player(player): Player,
    ApiQuery(q): ApiQuery<SessionQuery>,
) -> ApiResult<Report<ChunkStats>> {
    Ok(Json(state.engine.chunk.stats(&q.session_id, &player)?))
}
