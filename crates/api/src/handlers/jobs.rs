//! Handlers for job intake and the job resource.
//!
//! Two intake paths create jobs:
//!
//! - `POST /optimize` runs the job in-process. The handler creates the
//!   record, moves its [`JobWriter`] into a supervised runner task and
//!   returns without waiting.
//! - `POST /v1/jobs` hands the job to the queue bridge. The external worker
//!   then drives it through `POST /v1/jobs/{id}/status`.
//!
//! Each job therefore has exactly one writer, chosen by its origin.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use resumeopt_core::artifacts::{is_resume_file, validate_content_key};
use resumeopt_core::error::CoreError;
use resumeopt_core::job::{Job, JobOrigin, JobStatus, JobUpdate, StatusReport};
use resumeopt_core::store::{job_not_found, JobWriter};
use resumeopt_core::types::JobId;
use resumeopt_queue::JobMessage;
use serde::{Deserialize, Serialize};

use crate::engine::OptimizationRequest;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, OptimizeForm};
use crate::router::WORKER_TOKEN_HEADER;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// JSON body of `POST /v1/jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateJobRequest {
    pub resume_text: Option<String>,
    pub job_description: Option<String>,
}

/// Short job summary returned by the create endpoints.
#[derive(Debug, Serialize)]
pub struct JobCreated {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: String,
}

impl From<Job> for JobCreated {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            progress: job.progress,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Inline intake
// ---------------------------------------------------------------------------

/// POST /optimize
///
/// Validate the inputs, resolve the uploaded resume (if any), create a
/// `queued` job and schedule its runner. Returns immediately.
pub async fn start_optimization(
    State(state): State<AppState>,
    form: OptimizeForm,
) -> AppResult<impl IntoResponse> {
    let job_url = non_blank(form.job_url);
    let file_id = non_blank(form.file_id);
    let company_name = non_blank(form.company_name).unwrap_or_default();

    if job_url.is_none() && file_id.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "Either job_url or file_id is required".into(),
        )));
    }

    let resume_path = match &file_id {
        Some(file_id) => Some(resolve_resume(&state, file_id).await?),
        None => None,
    };

    let job = state.store.create(JobOrigin::Inline).await?;
    let request = OptimizationRequest {
        job_id: job.id.clone(),
        job_url,
        company_name,
        resume_path,
    };

    let writer = JobWriter::new(Arc::clone(&state.store), job.id.clone());
    let runner = Arc::clone(&state.runner);
    state.supervisor.spawn(job.id.clone(), async move {
        runner.run(writer, request).await;
    });

    tracing::info!(job_id = %job.id, file_id = ?file_id, "Optimization job created");

    Ok(Json(JobCreated::from(job)))
}

/// Find the stored resume for `file_id` under the uploads directory.
async fn resolve_resume(state: &AppState, file_id: &str) -> AppResult<PathBuf> {
    validate_content_key(file_id)?;
    let dir = state.layout.upload_dir(file_id);
    find_resume_in(&dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read {}: {e}", dir.display())))?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Resume file",
                id: file_id.to_string(),
            })
        })
}

async fn find_resume_in(dir: &FsPath) -> std::io::Result<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_resume_file(&path) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Queue intake
// ---------------------------------------------------------------------------

/// POST /v1/jobs
///
/// Create a `queued` job and publish it to the queue bridge. Both input
/// texts are optional; the worker scores whatever it is given. A publish
/// failure marks the job `failed`; the response is 202 either way and
/// carries the actual status. Without a bridge the job stays `queued`.
pub async fn create_queued_job(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateJobRequest>,
) -> AppResult<impl IntoResponse> {
    let resume_text = non_blank(input.resume_text);
    let job_description = non_blank(input.job_description);

    let mut job = state.store.create(JobOrigin::Queue).await?;

    let Some(queue) = &state.queue else {
        tracing::info!(job_id = %job.id, "Queue bridge not configured, job tracked only");
        return Ok((StatusCode::ACCEPTED, Json(JobCreated::from(job))));
    };

    let message = JobMessage {
        job_id: job.id.clone(),
        resume_text,
        job_description,
    };

    match queue.publish(&message).await {
        Ok(()) => {
            tracing::info!(job_id = %job.id, "Job published to queue");
        }
        Err(e) => {
            let reason = e.to_string();
            tracing::error!(job_id = %job.id, error = %reason, "Failed to publish job to queue");
            let job_id = job.id.clone();
            job = state
                .store
                .update(
                    &job_id,
                    JobUpdate::Fail {
                        progress: format!("Enqueue failed: {reason}"),
                        error: reason,
                    },
                )
                .await?;
        }
    }

    Ok((StatusCode::ACCEPTED, Json(JobCreated::from(job))))
}

/// POST /v1/jobs/{id}/status
///
/// Status report from the external worker for a queue-bridge job.
pub async fn report_status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
    headers: HeaderMap,
    AppJson(report): AppJson<StatusReport>,
) -> AppResult<impl IntoResponse> {
    if let Some(expected) = &state.config.worker_token {
        let presented = headers
            .get(WORKER_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Missing or invalid worker token".into(),
            )));
        }
    }

    let job = state.store.get(&job_id).await?;
    if job.origin != JobOrigin::Queue {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Job {job_id} is driven in-process and does not accept status reports"
        ))));
    }

    let reported = report.status;
    let update = report.into_update(job.status)?;
    let job = state.store.update(&job_id, update).await?;

    tracing::info!(job_id = %job_id, status = %reported, "Worker status report applied");

    Ok(Json(job))
}

// ---------------------------------------------------------------------------
// Read / delete
// ---------------------------------------------------------------------------

/// GET /job/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = state.store.get(&job_id).await?;
    Ok(Json(job))
}

/// GET /jobs
///
/// All jobs, oldest first.
pub async fn list_jobs(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let jobs = state.store.list().await?;
    Ok(Json(jobs))
}

/// DELETE /job/{id}
///
/// Remove the record, then best-effort remove `output/run-<id>`. A runner
/// still in flight is not stopped and may recreate the directory.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    if !state.store.delete(&job_id).await? {
        return Err(AppError::Core(job_not_found(&job_id)));
    }

    let run_dir = state.layout.run_dir(&job_id);
    match tokio::fs::remove_dir_all(&run_dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "Failed to remove job outputs");
        }
    }

    if state.supervisor.is_active(&job_id) {
        tracing::warn!(job_id = %job_id, "Deleted job still has a running task");
    }
    tracing::info!(job_id = %job_id, "Job deleted");

    Ok(Json(serde_json::json!({ "message": "Job deleted successfully" })))
}
