use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use resumeopt_core::error::CoreError;
use resumeopt_core::job::JobStatus;
use resumeopt_core::types::JobId;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

fn file_not_found(filename: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "File",
        id: filename.to_string(),
    })
}

/// GET /download/{id}/{filename}
///
/// Serve one artifact of a completed job. The status check comes first: a
/// job that is not `completed` yields `NotReady` even when the file exists.
pub async fn download_artifact(
    State(state): State<AppState>,
    Path((job_id, filename)): Path<(JobId, String)>,
) -> AppResult<impl IntoResponse> {
    let job = state.store.get(&job_id).await?;
    if job.status != JobStatus::Completed {
        return Err(AppError::Core(CoreError::NotReady(format!(
            "Job {job_id} is {}, not completed",
            job.status
        ))));
    }

    let path = state
        .layout
        .artifact_path(&job_id, &filename)
        .map_err(|_| file_not_found(&filename))?;

    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(file_not_found(&filename));
        }
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    };

    tracing::debug!(job_id = %job_id, file = %filename, bytes = data.len(), "Serving artifact");

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        data,
    ))
}
