//! Job store abstraction and the default in-memory backend.
//!
//! The store is the single source of truth for job status queries. Writes go
//! through [`JobStore::update`], which applies a [`JobUpdate`] to a copy of
//! the record and swaps the copy in atomically; a reader therefore never sees
//! a half-applied transition (e.g. `completed` without a result).
//!
//! State is volatile: the in-memory store starts empty on every process start.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::job::{Job, JobOrigin, JobResult, JobUpdate};
use crate::types::JobId;

/// Entity name used in `NotFound` errors.
const ENTITY_JOB: &str = "Job";

/// Build the `NotFound` error for a job id.
pub fn job_not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: ENTITY_JOB,
        id: id.to_string(),
    }
}

/// Mapping from job id to job record with atomic per-key updates.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a new `queued` job with a fresh, never-reused id.
    async fn create(&self, origin: JobOrigin) -> Result<Job, CoreError>;

    async fn get(&self, id: &str) -> Result<Job, CoreError>;

    /// All jobs, oldest first.
    async fn list(&self) -> Result<Vec<Job>, CoreError>;

    /// Apply a transition atomically and return the updated record.
    async fn update(&self, id: &str, update: JobUpdate) -> Result<Job, CoreError>;

    /// Remove a job. Returns `false` if it did not exist.
    async fn delete(&self, id: &str) -> Result<bool, CoreError>;
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, origin: JobOrigin) -> Result<Job, CoreError> {
        let mut jobs = self.jobs.write().await;
        let mut id = uuid::Uuid::new_v4().to_string();
        while jobs.contains_key(&id) {
            id = uuid::Uuid::new_v4().to_string();
        }
        let job = Job::new(id.clone(), origin);
        jobs.insert(id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: &str) -> Result<Job, CoreError> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| job_not_found(id))
    }

    async fn list(&self) -> Result<Vec<Job>, CoreError> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(jobs)
    }

    async fn update(&self, id: &str, update: JobUpdate) -> Result<Job, CoreError> {
        let mut jobs = self.jobs.write().await;
        let current = jobs.get(id).ok_or_else(|| job_not_found(id))?;

        let mut next = current.clone();
        next.apply(update)?;
        jobs.insert(id.to_string(), next.clone());
        Ok(next)
    }

    async fn delete(&self, id: &str) -> Result<bool, CoreError> {
        Ok(self.jobs.write().await.remove(id).is_some())
    }
}

// ---------------------------------------------------------------------------
// JobWriter
// ---------------------------------------------------------------------------

/// Exclusive write handle for one job.
///
/// Created once per job and moved into whichever task drives it. It is not
/// `Clone`, and the terminal operations consume it, so a job has exactly one
/// writer and nothing can be written after its terminal state.
pub struct JobWriter {
    store: Arc<dyn JobStore>,
    job_id: JobId,
}

impl JobWriter {
    pub fn new(store: Arc<dyn JobStore>, job_id: JobId) -> Self {
        Self { store, job_id }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub async fn start(&self, progress: impl Into<String>) -> Result<Job, CoreError> {
        self.store
            .update(
                &self.job_id,
                JobUpdate::Start {
                    progress: progress.into(),
                },
            )
            .await
    }

    pub async fn progress(&self, progress: impl Into<String>) -> Result<Job, CoreError> {
        self.store
            .update(&self.job_id, JobUpdate::Progress(progress.into()))
            .await
    }

    pub async fn complete(
        self,
        progress: impl Into<String>,
        result: JobResult,
    ) -> Result<Job, CoreError> {
        self.store
            .update(
                &self.job_id,
                JobUpdate::Complete {
                    progress: progress.into(),
                    result,
                },
            )
            .await
    }

    pub async fn fail(
        self,
        progress: impl Into<String>,
        error: impl Into<String>,
    ) -> Result<Job, CoreError> {
        self.store
            .update(
                &self.job_id,
                JobUpdate::Fail {
                    progress: progress.into(),
                    error: error.into(),
                },
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;

    use super::*;
    use crate::job::JobStatus;

    fn store() -> Arc<dyn JobStore> {
        Arc::new(InMemoryJobStore::new())
    }

    #[tokio::test]
    async fn create_then_get_returns_queued_job() {
        let store = store();
        let job = store.create(JobOrigin::Inline).await.unwrap();
        let fetched = store.get(&job.id).await.unwrap();
        assert_eq!(fetched, job);
        assert_eq!(fetched.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let store = store();
        assert_matches!(
            store.get("missing").await,
            Err(CoreError::NotFound { entity: "Job", .. })
        );
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = store();
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let job = store.create(JobOrigin::Inline).await.unwrap();
            assert!(seen.insert(job.id));
        }
        assert_eq!(store.list().await.unwrap().len(), 200);
    }

    #[tokio::test]
    async fn list_is_ordered_by_creation() {
        let store = store();
        let first = store.create(JobOrigin::Inline).await.unwrap();
        let second = store.create(JobOrigin::Queue).await.unwrap();
        let listed = store.list().await.unwrap();
        let first_pos = listed.iter().position(|j| j.id == first.id).unwrap();
        let second_pos = listed.iter().position(|j| j.id == second.id).unwrap();
        assert!(first_pos < second_pos);
    }

    #[tokio::test]
    async fn delete_removes_from_list() {
        let store = store();
        let job = store.create(JobOrigin::Inline).await.unwrap();
        assert!(store.delete(&job.id).await.unwrap());
        assert!(!store.delete(&job.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_update_leaves_record_untouched() {
        let store = store();
        let job = store.create(JobOrigin::Inline).await.unwrap();
        let err = store
            .update(
                &job.id,
                JobUpdate::Complete {
                    progress: "x".into(),
                    result: JobResult::default(),
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::InvalidTransition { .. });
        assert_eq!(store.get(&job.id).await.unwrap(), job);
    }

    #[tokio::test]
    async fn writer_drives_job_to_completion() {
        let store = store();
        let job = store.create(JobOrigin::Inline).await.unwrap();
        let writer = JobWriter::new(Arc::clone(&store), job.id.clone());

        writer.start("Initializing...").await.unwrap();
        writer.progress("Working").await.unwrap();
        let done = writer
            .complete(
                "Done",
                JobResult {
                    raw_summary: "ok".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.result.unwrap().raw_summary, "ok");
    }

    #[tokio::test]
    async fn writer_on_deleted_job_is_not_found() {
        let store = store();
        let job = store.create(JobOrigin::Inline).await.unwrap();
        let writer = JobWriter::new(Arc::clone(&store), job.id.clone());
        store.delete(&job.id).await.unwrap();

        assert_matches!(
            writer.start("Initializing...").await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_interfere() {
        let store = store();
        let a = store.create(JobOrigin::Inline).await.unwrap();
        let b = store.create(JobOrigin::Inline).await.unwrap();

        let wa = JobWriter::new(Arc::clone(&store), a.id.clone());
        let wb = JobWriter::new(Arc::clone(&store), b.id.clone());

        let ta = tokio::spawn(async move {
            wa.start("a").await.unwrap();
            wa.complete("a done", JobResult::default()).await.unwrap();
        });
        let tb = tokio::spawn(async move {
            wb.start("b").await.unwrap();
            wb.fail("b failed", "b broke").await.unwrap();
        });
        ta.await.unwrap();
        tb.await.unwrap();

        assert_eq!(store.get(&a.id).await.unwrap().status, JobStatus::Completed);
        let b = store.get(&b.id).await.unwrap();
        assert_eq!(b.status, JobStatus::Failed);
        assert_eq!(b.error.as_deref(), Some("b broke"));
    }
}
