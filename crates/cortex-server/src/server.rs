use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use cortex_engine::GameEngine;
use cortex_telemetry::MetricsRecorder;

use crate::handlers::{binary, chunk, dual, pattern, progress, stroop, system};

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Shared application state passed to axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GameEngine>,
    pub metrics: Arc<MetricsRecorder>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: Arc<GameEngine>, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            engine,
            metrics,
            started_at: Instant::now(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/pattern/start", post(pattern::start))
        .route("/pattern/submit", post(pattern::submit))
        .route("/pattern/stats", get(pattern::stats))
        .route("/pattern/progress", get(pattern::progress))
        .route("/pattern/profile", get(pattern::profile))
        .route("/pattern/brain_profile", get(pattern::brain_profile))
        .route("/binary/start", post(binary::start))
        .route("/binary/guess", post(binary::guess))
        .route("/binary/stats", get(binary::stats))
        .route("/dual/start", post(dual::start))
        .route("/dual/submit", post(dual::submit))
        .route("/dual/stats", get(dual::stats))
        .route("/stroop/start", post(stroop::start))
        .route("/stroop/submit", post(stroop::submit))
        .route("/stroop/stats", get(stroop::stats))
        .route("/chunk/start", post(chunk::start))
        .route("/chunk/submit", post(chunk::submit))
        .route("/chunk/stats", get(chunk::stats))
        .route("/progress/{kind}", get(progress::history))
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve in a background task. Port 0 picks a free port.
pub async fn start(
    config: ServerConfig,
    engine: Arc<GameEngine>,
    metrics: Arc<MetricsRecorder>,
) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(AppState::new(engine, metrics));
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let serve = axum::serve(listener, router).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(e) = serve.await {
            tracing::error!(error = %e, "server exited with error");
        }
    });

    tracing::info!(host = %config.host, port = local_addr.port(), "cortex server started");
    Ok(ServerHandle {
        port: local_addr.port(),
        shutdown: Some(shutdown_tx),
        server,
    })
}

/// Keeps the server running. Dropping it triggers graceful shutdown;
/// [`ServerHandle::shutdown`] also waits for in-flight requests.
pub struct ServerHandle {
    pub port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.server.await {
            tracing::warn!(error = %e, "server task did not join cleanly");
        }
    }
}
