use std::sync::Arc;

use resumeopt_core::artifacts::ArtifactLayout;
use resumeopt_core::store::JobStore;
use resumeopt_queue::JobQueue;

use crate::config::ServerConfig;
use crate::engine::{JobRunner, JobSupervisor};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Job records, the single source of truth for status queries.
    pub store: Arc<dyn JobStore>,
    /// Executes inline jobs.
    pub runner: Arc<JobRunner>,
    /// Background tasks spawned for inline jobs.
    pub supervisor: JobSupervisor,
    /// Queue bridge for `/v1/jobs`, when configured.
    pub queue: Option<Arc<dyn JobQueue>>,
    /// Where uploads and run outputs live on disk.
    pub layout: ArtifactLayout,
}
