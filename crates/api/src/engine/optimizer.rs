//! The external optimization collaborator.
//!
//! The service does not optimize resumes itself. [`Optimizer`] is the seam to
//! whatever does; [`HttpOptimizer`] calls a remote optimizer service over
//! HTTP and writes the artifacts it returns into the job's run directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use resumeopt_core::artifacts::validate_artifact_name;
use resumeopt_core::types::JobId;
use serde::{Deserialize, Serialize};

/// Longest error body kept from a failed optimizer response.
const MAX_ERROR_BODY: usize = 500;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failure of a job's optimization step. Fatal to the job.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The optimizer could not be reached or its reply could not be parsed.
    #[error("Optimizer request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The optimizer answered with a non-2xx status.
    #[error("Optimizer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The optimizer returned an artifact name that is not a plain file name.
    #[error("Optimizer returned an invalid artifact name '{0}'")]
    InvalidArtifact(String),

    /// Writing or collecting artifacts failed.
    #[error("Artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Any other optimizer-reported failure.
    #[error("{0}")]
    Optimizer(String),
}

// ---------------------------------------------------------------------------
// Collaborator seam
// ---------------------------------------------------------------------------

/// Inputs of one optimization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationRequest {
    pub job_id: JobId,
    pub job_url: Option<String>,
    pub company_name: String,
    pub resume_path: Option<PathBuf>,
}

#[async_trait]
pub trait Optimizer: Send + Sync {
    /// Run the optimization, leaving any artifacts in `output_dir`, and return
    /// the raw summary text.
    async fn optimize(
        &self,
        request: &OptimizationRequest,
        output_dir: &Path,
    ) -> Result<String, RunnerError>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct OptimizeCall<'a> {
    job_id: &'a str,
    job_url: Option<&'a str>,
    company_name: &'a str,
    resume_path: Option<String>,
    output_dir: String,
}

#[derive(Debug, Deserialize)]
struct OptimizeReply {
    #[serde(default)]
    summary: String,
    /// File name -> text content.
    #[serde(default)]
    artifacts: BTreeMap<String, String>,
}

/// Calls `POST <base_url>/optimize` on a remote optimizer service.
pub struct HttpOptimizer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOptimizer {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RunnerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/optimize", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Optimizer for HttpOptimizer {
    async fn optimize(
        &self,
        request: &OptimizationRequest,
        output_dir: &Path,
    ) -> Result<String, RunnerError> {
        let call = OptimizeCall {
            job_id: &request.job_id,
            job_url: request.job_url.as_deref(),
            company_name: &request.company_name,
            resume_path: request
                .resume_path
                .as_ref()
                .map(|p| p.display().to_string()),
            output_dir: output_dir.display().to_string(),
        };

        let response = self.client.post(self.endpoint()).json(&call).send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(RunnerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: OptimizeReply = response.json().await?;
        write_artifacts(output_dir, &reply.artifacts).await?;
        Ok(reply.summary)
    }
}

/// Write returned artifacts into `output_dir`, validating every name first.
async fn write_artifacts(
    output_dir: &Path,
    artifacts: &BTreeMap<String, String>,
) -> Result<(), RunnerError> {
    if artifacts.is_empty() {
        return Ok(());
    }
    for name in artifacts.keys() {
        validate_artifact_name(name).map_err(|_| RunnerError::InvalidArtifact(name.clone()))?;
    }

    tokio::fs::create_dir_all(output_dir).await?;
    for (name, content) in artifacts {
        tokio::fs::write(output_dir.join(name), content).await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
