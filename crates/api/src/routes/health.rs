use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` while every worker is alive, `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Worker tasks still running.
    pub workers: usize,
    /// Jobs waiting for a worker.
    pub queue_depth: usize,
}

/// GET /health -- returns service and worker-pool health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let workers = state.pool.live_workers();
    let status = if workers == state.pool.workers() { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        workers,
        queue_depth: state.dispatcher.queue_depth(),
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
