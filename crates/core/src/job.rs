//! Job record, lifecycle states, and the transition table.
//!
//! A job moves `queued -> running -> {completed, failed}`; an enqueue failure
//! may also take it straight from `queued` to `failed`. Terminal states are
//! final. [`Job::apply`] is the only place the table is enforced, so every
//! store backend shares the same rules.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

/// Progress text for a job created through `/optimize`.
pub const PROGRESS_STARTING: &str = "Starting optimization...";

/// Progress text for a job created through the queue bridge.
pub const PROGRESS_QUEUED: &str = "Queued";

// ---------------------------------------------------------------------------
// Status / origin
// ---------------------------------------------------------------------------

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` are terminal; nothing leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which intake path created the job, and therefore who may write to it.
///
/// `Inline` jobs are driven by the in-process runner. `Queue` jobs are
/// driven by an external worker through status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOrigin {
    Inline,
    Queue,
}

// ---------------------------------------------------------------------------
// Result payload
// ---------------------------------------------------------------------------

/// Outcome of a completed job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// Artifact file name -> local path.
    #[serde(default)]
    pub output_files: BTreeMap<String, String>,
    /// Artifact file name -> object storage URL. Only successful uploads.
    #[serde(default)]
    pub uploaded_locators: BTreeMap<String, String>,
    /// Raw summary text returned by the optimizer.
    #[serde(default)]
    pub raw_summary: String,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    #[serde(rename = "job_id")]
    pub id: JobId,
    pub status: JobStatus,
    pub origin: JobOrigin,
    pub progress: String,
    pub result: Option<JobResult>,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A single state change requested by the job's owner.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    Start { progress: String },
    Progress(String),
    Complete { progress: String, result: JobResult },
    Fail { progress: String, error: String },
}

impl JobUpdate {
    pub fn name(&self) -> &'static str {
        match self {
            JobUpdate::Start { .. } => "start",
            JobUpdate::Progress(_) => "progress",
            JobUpdate::Complete { .. } => "complete",
            JobUpdate::Fail { .. } => "fail",
        }
    }
}

impl Job {
    /// A fresh job in `queued` with neither result nor error.
    pub fn new(id: JobId, origin: JobOrigin) -> Self {
        let now = Utc::now();
        let progress = match origin {
            JobOrigin::Inline => PROGRESS_STARTING,
            JobOrigin::Queue => PROGRESS_QUEUED,
        };
        Self {
            id,
            status: JobStatus::Queued,
            origin,
            progress: progress.to_string(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `update`, or reject it without touching the record.
    pub fn apply(&mut self, update: JobUpdate) -> Result<(), CoreError> {
        let allowed = match &update {
            JobUpdate::Start { .. } => self.status == JobStatus::Queued,
            JobUpdate::Progress(_) | JobUpdate::Fail { .. } => !self.status.is_terminal(),
            JobUpdate::Complete { .. } => self.status == JobStatus::Running,
        };
        if !allowed {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                update: update.name(),
            });
        }

        match update {
            JobUpdate::Start { progress } => {
                self.status = JobStatus::Running;
                self.progress = progress;
            }
            JobUpdate::Progress(progress) => {
                self.progress = progress;
            }
            JobUpdate::Complete { progress, result } => {
                self.status = JobStatus::Completed;
                self.progress = progress;
                self.result = Some(result);
            }
            JobUpdate::Fail { progress, error } => {
                self.status = JobStatus::Failed;
                self.progress = progress;
                self.error = Some(error);
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Status reports (external worker -> API)
// ---------------------------------------------------------------------------

/// Status update posted by an out-of-process worker for a queue-origin job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    pub fn running(progress: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Running,
            progress: Some(progress.into()),
            result: None,
            error: None,
        }
    }

    pub fn completed(result: JobResult) -> Self {
        Self {
            status: JobStatus::Completed,
            progress: None,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            progress: None,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Translate the report into a [`JobUpdate`] against a job currently in
    /// `current`. A `running` report on a running job is a progress update.
    pub fn into_update(self, current: JobStatus) -> Result<JobUpdate, CoreError> {
        match self.status {
            JobStatus::Queued => Err(CoreError::Validation(
                "A job cannot be reported back to queued".into(),
            )),
            JobStatus::Running => {
                let progress = self.progress.unwrap_or_else(|| "Running".to_string());
                if current == JobStatus::Running {
                    Ok(JobUpdate::Progress(progress))
                } else {
                    Ok(JobUpdate::Start { progress })
                }
            }
            JobStatus::Completed => {
                let result = self.result.ok_or_else(|| {
                    CoreError::Validation("A completed report must carry a result".into())
                })?;
                Ok(JobUpdate::Complete {
                    progress: self
                        .progress
                        .unwrap_or_else(|| "Optimization completed successfully".to_string()),
                    result,
                })
            }
            JobStatus::Failed => {
                let error = self
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .ok_or_else(|| {
                        CoreError::Validation("A failed report must carry an error".into())
                    })?;
                Ok(JobUpdate::Fail {
                    progress: self
                        .progress
                        .unwrap_or_else(|| format!("Optimization failed: {error}")),
                    error,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
