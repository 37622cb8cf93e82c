//! Drives a single inline job from `queued` to a terminal state.
//!
//! 1. `running`, progress "Initializing..."
//! 2. call the optimizer collaborator
//! 3. collect artifacts from the job's run directory, publish them when
//!    object storage is configured, then `completed`
//! 4. any optimizer or collection failure: `failed` with the reason
//!
//! Failures are not retried. Upload failures are not failures of the job.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use resumeopt_cloud::{publish_all, ArtifactPublisher, StorageConfig};
use resumeopt_core::artifacts::ArtifactLayout;
use resumeopt_core::error::CoreError;
use resumeopt_core::job::JobResult;
use resumeopt_core::store::JobWriter;

use super::optimizer::{OptimizationRequest, Optimizer, RunnerError};

pub const PROGRESS_INITIALIZING: &str = "Initializing...";
pub const PROGRESS_OPTIMIZING: &str = "Running optimization...";
pub const PROGRESS_PROCESSING: &str = "Processing results...";
pub const PROGRESS_COMPLETED: &str = "Optimization completed successfully";

/// Artifact publisher plus the bucket/prefix it publishes to.
struct Publishing {
    publisher: Arc<dyn ArtifactPublisher>,
    storage: StorageConfig,
}

pub struct JobRunner {
    optimizer: Arc<dyn Optimizer>,
    layout: ArtifactLayout,
    publishing: Option<Publishing>,
}

impl JobRunner {
    /// A runner that keeps artifacts local only.
    pub fn new(optimizer: Arc<dyn Optimizer>, layout: ArtifactLayout) -> Self {
        Self {
            optimizer,
            layout,
            publishing: None,
        }
    }

    /// Also publish each job's artifacts to object storage.
    pub fn with_publisher(
        mut self,
        publisher: Arc<dyn ArtifactPublisher>,
        storage: StorageConfig,
    ) -> Self {
        self.publishing = Some(Publishing { publisher, storage });
        self
    }

    /// Run one job to completion. Never returns an error: the outcome is
    /// recorded on the job.
    ///
    /// A job deleted mid-run keeps running; its writes then fail with
    /// `NotFound` and are only logged.
    pub async fn run(&self, writer: JobWriter, request: OptimizationRequest) {
        let job_id = writer.job_id().to_string();

        note_write(&job_id, writer.start(PROGRESS_INITIALIZING).await);
        tracing::info!(job_id = %job_id, "Job started");

        match self.execute(&writer, &request).await {
            Ok(result) => {
                let files = result.output_files.len();
                let uploads = result.uploaded_locators.len();
                note_write(&job_id, writer.complete(PROGRESS_COMPLETED, result).await);
                tracing::info!(job_id = %job_id, files, uploads, "Job completed");
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!(job_id = %job_id, error = %reason, "Job failed");
                note_write(
                    &job_id,
                    writer
                        .fail(format!("Optimization failed: {reason}"), reason)
                        .await,
                );
            }
        }
    }

    async fn execute(
        &self,
        writer: &JobWriter,
        request: &OptimizationRequest,
    ) -> Result<JobResult, RunnerError> {
        let job_id = writer.job_id();
        let run_dir = self.layout.run_dir(job_id);

        note_write(job_id, writer.progress(PROGRESS_OPTIMIZING).await);
        let summary = self.optimizer.optimize(request, &run_dir).await?;

        note_write(job_id, writer.progress(PROGRESS_PROCESSING).await);
        let artifacts = collect_artifacts(&run_dir).await?;

        let uploaded_locators = match &self.publishing {
            Some(p) => publish_all(p.publisher.as_ref(), &p.storage, job_id, &artifacts).await,
            None => BTreeMap::new(),
        };

        let output_files = artifacts
            .into_iter()
            .map(|(name, path)| (name, path.display().to_string()))
            .collect();

        Ok(JobResult {
            output_files,
            uploaded_locators,
            raw_summary: summary,
        })
    }
}

/// Regular files directly inside `dir`, by name. A missing directory means
/// the run produced nothing.
pub async fn collect_artifacts(dir: &Path) -> Result<BTreeMap<String, PathBuf>, std::io::Error> {
    let mut artifacts = BTreeMap::new();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(artifacts),
        Err(e) => return Err(e),
    };

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            artifacts.insert(name.to_string(), entry.path());
        }
    }

    Ok(artifacts)
}

/// Log a store write the runner could not make.
fn note_write<T>(job_id: &str, outcome: Result<T, CoreError>) {
    match outcome {
        Ok(_) => {}
        Err(CoreError::NotFound { .. }) => {
            tracing::warn!(job_id, "Job record no longer exists, continuing untracked");
        }
        Err(e) => {
            tracing::error!(job_id, error = %e, "Failed to update job record");
        }
    }
}
