use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use cortex_core::binary::BinaryDifficulty;
use cortex_core::SessionId;
use cortex_engine::binary::{DuelStart, DuelStats, GuessOutcome};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, Player, SessionQuery};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub difficulty: BinaryDifficulty,
}

#[derive(Debug, Deserialize)]
pub struct GuessRequest {
    pub session_id: SessionId,
    pub guess: u32,
}

pub async fn start(
    State(state): State<AppState>,
    Player(player): Player,
    ApiJson(req): ApiJson<StartRequest>,
) -> ApiResult<DuelStart> {
    Ok(Json(state.engine.binary.start(&player, req.difficulty)?))
}

pub async fn guess(
    State(state): State<AppState>,
    Player(player): Player,
    ApiJson(req): ApiJson<GuessRequest>,
) -> ApiResult<GuessOutcome> {
    Ok(Json(state.engine.binary.guess(&req.session_id, &player, req.guess)?))
}

pub async fn stats(
    State(state): State<AppState>,
    Player(player): Player,
    ApiQuery(q): ApiQuery<SessionQuery>,
) -> ApiResult<DuelStats> {
    Ok(Json(state.engine.binary.stats(&q.session_id, &player)?))
}
