//! Owner of the background job tasks spawned by request handlers.
//!
//! Handlers hand a runner future to [`JobSupervisor::spawn`] and return
//! immediately. The supervisor tracks which job ids are in flight for the
//! health endpoint, and on shutdown waits for them to drain. Jobs are never
//! cancelled.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use resumeopt_core::types::JobId;
use tokio_util::task::TaskTracker;

#[derive(Clone, Default)]
pub struct JobSupervisor {
    tracker: TaskTracker,
    active: Arc<Mutex<HashSet<JobId>>>,
}

/// Removes the job id from the active set when the task ends, whether it
/// returned or panicked.
struct ActiveGuard {
    active: Arc<Mutex<HashSet<JobId>>>,
    job_id: JobId,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.job_id);
    }
}

impl JobSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` in the background for `job_id`. Never waits on it.
    pub fn spawn<F>(&self, job_id: JobId, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id.clone());

        let guard = ActiveGuard {
            active: Arc::clone(&self.active),
            job_id: job_id.clone(),
        };

        self.tracker.spawn(async move {
            let _guard = guard;
            fut.await;
        });

        tracing::debug!(job_id = %job_id, "Job task spawned");
    }

    pub fn is_active(&self, job_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(job_id)
    }

    /// Number of job tasks still running.
    pub fn active_count(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting work and wait up to `timeout` for in-flight jobs.
    /// Returns `false` if some were still running at the deadline.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let remaining = self.tracker.len();
        if remaining > 0 {
            tracing::info!(remaining, "Waiting for in-flight jobs to finish");
        }

        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    remaining = self.tracker.len(),
                    "Shutdown timeout reached with jobs still running",
                );
                false
            }
        }
    }
}
