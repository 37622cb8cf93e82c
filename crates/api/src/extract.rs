//! Request extractors whose rejections use the `{error, code}` error body.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;
use serde::Deserialize;

use crate::error::AppError;

/// `axum::Json` with malformed bodies reported as [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Form fields of `POST /optimize`, sent either urlencoded or as
/// `multipart/form-data`. Empty strings count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct OptimizeForm {
    pub job_url: Option<String>,
    pub company_name: Option<String>,
    pub file_id: Option<String>,
}

impl<S> FromRequest<S> for OptimizeForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(form) = Form::<OptimizeForm>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Ok(form);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut form = OptimizeForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let slot = match field.name() {
                Some("job_url") => &mut form.job_url,
                Some("company_name") => &mut form.company_name,
                Some("file_id") => &mut form.file_id,
                _ => continue,
            };
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            *slot = Some(value);
        }
        Ok(form)
    }
}
