use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{downloads, uploads};
use crate::state::AppState;

/// ```text
/// POST   /upload-resume               -> upload_resume
/// GET    /download/{id}/{filename}    -> download_artifact
/// ```
///
/// Uploads are capped at `max_upload_bytes`.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload-resume",
            post(uploads::upload_resume).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/download/{id}/{filename}", get(downloads::download_artifact))
}
