use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Human-readable description.
    pub message: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Inline jobs currently running in this process.
    pub active_jobs: usize,
}

/// GET / -- basic liveness.
async fn root(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health(&state, "Resume Optimizer API is running"))
}

/// GET /health -- liveness for monitoring.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health(&state, "Service is operational"))
}

fn health(state: &AppState, message: &'static str) -> HealthResponse {
    HealthResponse {
        status: "healthy",
        message,
        version: env!("CARGO_PKG_VERSION"),
        active_jobs: state.supervisor.active_count(),
    }
}

/// Mount health check routes at the root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
