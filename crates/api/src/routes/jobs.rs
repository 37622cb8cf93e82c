//! Route definitions for job intake and the job resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// ```text
/// POST   /optimize                -> start_optimization
/// POST   /v1/jobs                 -> create_queued_job
/// POST   /v1/jobs/{id}/status     -> report_status
/// GET    /job/{id}                -> get_job
/// DELETE /job/{id}                -> delete_job
/// GET    /jobs                    -> list_jobs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/optimize", post(jobs::start_optimization))
        .route("/v1/jobs", post(jobs::create_queued_job))
        .route("/v1/jobs/{id}/status", post(jobs::report_status))
        .route("/job/{id}", get(jobs::get_job).delete(jobs::delete_job))
        .route("/jobs", get(jobs::list_jobs))
}
