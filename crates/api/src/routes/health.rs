use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Jobs in the queue, claimed or not.
    pub jobs: usize,
    /// Registered workers, active or not.
    pub workers: usize,
}

/// GET /health -- returns service status and queue size.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = sakura_store::health_check(&state.pool).await;

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        jobs: stats.jobs,
        workers: stats.workers,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
