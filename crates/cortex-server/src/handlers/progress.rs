use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use cortex_core::GameKind;
use cortex_engine::progress::HistoryEntry;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiQuery, Player};
use crate::server::AppState;

const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

pub async fn history(
    State(state): State<AppState>,
    Player(player): Player,
    Path(kind): Path<String>,
    ApiQuery(q): ApiQuery<HistoryQuery>,
) -> ApiResult<Vec<HistoryEntry>> {
    let kind: GameKind = kind.parse().map_err(ApiError::invalid)?;
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT);
    Ok(Json(state.engine.progress.history(&player, kind, limit)?))
}
