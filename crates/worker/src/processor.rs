//! Processing of one queue message: score, persist, publish, report.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use resumeopt_cloud::{publish_all, ArtifactPublisher, StorageConfig};
use resumeopt_core::artifacts::ArtifactLayout;
use resumeopt_core::job::{JobResult, StatusReport};
use resumeopt_queue::JobMessage;

use crate::error::WorkerError;
use crate::reporter::StatusReporter;
use crate::scoring::ScoringClient;

/// Name of the results file written into the job's run directory.
pub const RESULTS_FILE: &str = "scoring_results.json";

pub const PROGRESS_SCORING: &str = "Scoring resume...";

/// Handles messages popped off the queue.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one message. Failures are reported on the job, not returned.
    async fn handle(&self, message: JobMessage);
}

pub struct Processor {
    scoring: ScoringClient,
    reporter: StatusReporter,
    layout: ArtifactLayout,
    publishing: Option<(Arc<dyn ArtifactPublisher>, StorageConfig)>,
}

impl Processor {
    pub fn new(scoring: ScoringClient, reporter: StatusReporter, layout: ArtifactLayout) -> Self {
        Self {
            scoring,
            reporter,
            layout,
            publishing: None,
        }
    }

    pub fn with_publisher(
        mut self,
        publisher: Arc<dyn ArtifactPublisher>,
        storage: StorageConfig,
    ) -> Self {
        self.publishing = Some((publisher, storage));
        self
    }

    async fn process(&self, message: &JobMessage) -> Result<JobResult, WorkerError> {
        let job_id = message.job_id.as_str();
        let results = self.scoring.score(message).await?;

        let run_dir = self.layout.run_dir(job_id);
        tokio::fs::create_dir_all(&run_dir).await?;
        let results_path = run_dir.join(RESULTS_FILE);
        tokio::fs::write(&results_path, serde_json::to_vec_pretty(&results)?).await?;

        let artifacts: BTreeMap<String, PathBuf> =
            BTreeMap::from([(RESULTS_FILE.to_string(), results_path)]);

        let uploaded_locators = match &self.publishing {
            Some((publisher, storage)) => {
                publish_all(publisher.as_ref(), storage, job_id, &artifacts).await
            }
            None => BTreeMap::new(),
        };

        Ok(JobResult {
            output_files: artifacts
                .into_iter()
                .map(|(name, path)| (name, path.display().to_string()))
                .collect(),
            uploaded_locators,
            raw_summary: serde_json::to_string(&results)?,
        })
    }
}

#[async_trait]
impl MessageHandler for Processor {
    async fn handle(&self, message: JobMessage) {
        let job_id = message.job_id.clone();
        tracing::info!(job_id = %job_id, "Processing job");

        if let Err(e) = self
            .reporter
            .report(&job_id, &StatusReport::running(PROGRESS_SCORING))
            .await
        {
            // The API refused or never saw the transition; nothing to drive.
            tracing::error!(job_id = %job_id, error = %e, "Could not mark job running, skipping");
            return;
        }

        let report = match self.process(&message).await {
            Ok(result) => {
                tracing::info!(job_id = %job_id, uploads = result.uploaded_locators.len(), "Job scored");
                StatusReport::completed(result)
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Job failed");
                StatusReport::failed(e.to_string())
            }
        };

        if let Err(e) = self.reporter.report(&job_id, &report).await {
            tracing::error!(job_id = %job_id, error = %e, "Could not report job outcome");
        }
    }
}
