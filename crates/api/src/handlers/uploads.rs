//! Handler for `POST /upload-resume`.
//!
//! Uploads are content-addressed: the `file_id` is the short SHA-256 key of
//! the bytes, so uploading the same resume twice yields the same id and
//! replaces the stored copy.

use axum::extract::{Multipart, State};
use axum::Json;
use resumeopt_core::artifacts::{content_key, is_supported_resume_type, resume_file_name};
use resumeopt_core::error::CoreError;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResumeUploaded {
    pub file_id: String,
    pub file_path: String,
    pub message: &'static str,
}

/// Uploaded `file` part: original name, declared content type, bytes.
struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// POST /upload-resume
///
/// Accepts a multipart form with a required `file` field (PDF, DOCX or plain
/// text). Stores it as `knowledge/<file_id>/resume.<ext>`.
pub async fn upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ResumeUploaded>> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some(UploadedFile {
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }

    let upload =
        upload.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let content_type = upload.content_type.as_deref().unwrap_or("");
    if !is_supported_resume_type(content_type) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "File type {content_type} not supported. Allowed types: PDF, DOCX, TXT"
        ))));
    }
    if upload.data.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Uploaded file is empty".into(),
        )));
    }

    let file_id = content_key(&upload.data);
    let dir = state.layout.upload_dir(&file_id);

    // Same bytes, same directory: replace whatever a previous upload left.
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    }
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let file_path = dir.join(resume_file_name(
        upload.file_name.as_deref(),
        Some(content_type),
    ));
    tokio::fs::write(&file_path, &upload.data)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    tracing::info!(
        file_id = %file_id,
        bytes = upload.data.len(),
        "Resume uploaded",
    );

    Ok(Json(ResumeUploaded {
        file_id,
        file_path: file_path.display().to_string(),
        message: "File uploaded successfully",
    }))
}
