use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use cortex_telemetry::MetricsReport;

use crate::server::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptimeSecs": state.started_at.elapsed().as_secs(),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.metrics.report())
}
