#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use resumeopt_cloud::{ArtifactPublisher, StorageConfig, UploadError};
use resumeopt_core::artifacts::ArtifactLayout;
use resumeopt_core::job::Job;
use resumeopt_core::store::{InMemoryJobStore, JobStore};
use resumeopt_queue::{JobMessage, JobQueue, QueueError};
use tempfile::TempDir;
use tower::ServiceExt;

use resumeopt_api::config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use resumeopt_api::engine::{JobRunner, JobSupervisor, OptimizationRequest, Optimizer, RunnerError};
use resumeopt_api::router::build_app_router;
use resumeopt_api::state::AppState;

// ---------------------------------------------------------------------------
// Collaborator fakes
// ---------------------------------------------------------------------------

/// Writes a fixed set of artifacts and records every request it receives.
pub struct StubOptimizer {
    artifacts: Vec<(&'static str, &'static str)>,
    summary: &'static str,
    pub requests: Mutex<Vec<OptimizationRequest>>,
}

impl StubOptimizer {
    pub fn new(artifacts: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            artifacts,
            summary: "Resume tailored",
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<OptimizationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for StubOptimizer {
    fn default() -> Self {
        Self::new(vec![
            ("optimized_resume.md", "# Optimized resume"),
            ("final_report.md", "# Report"),
        ])
    }
}

#[async_trait]
impl Optimizer for StubOptimizer {
    async fn optimize(
        &self,
        request: &OptimizationRequest,
        output_dir: &Path,
    ) -> Result<String, RunnerError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::fs::create_dir_all(output_dir).await?;
        for (name, content) in &self.artifacts {
            tokio::fs::write(output_dir.join(name), content).await?;
        }
        Ok(self.summary.to_string())
    }
}

/// Always fails with the given reason.
pub struct FailingOptimizer(pub &'static str);

#[async_trait]
impl Optimizer for FailingOptimizer {
    async fn optimize(
        &self,
        _request: &OptimizationRequest,
        _output_dir: &Path,
    ) -> Result<String, RunnerError> {
        Err(RunnerError::Optimizer(self.0.to_string()))
    }
}

/// Blocks until released, so a job can be observed mid-run.
pub struct GatedOptimizer {
    pub gate: tokio::sync::Semaphore,
}

impl GatedOptimizer {
    pub fn new() -> Self {
        Self {
            gate: tokio::sync::Semaphore::new(0),
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl Optimizer for GatedOptimizer {
    async fn optimize(
        &self,
        _request: &OptimizationRequest,
        output_dir: &Path,
    ) -> Result<String, RunnerError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| RunnerError::Optimizer(e.to_string()))?;
        tokio::fs::create_dir_all(output_dir).await?;
        tokio::fs::write(output_dir.join("final_report.md"), "late").await?;
        Ok("released".into())
    }
}

/// Publishes to memory; fails for the configured file names.
#[derive(Default)]
pub struct RecordingPublisher {
    pub failing: HashSet<String>,
    pub published: Mutex<Vec<(String, String)>>,
}

impl RecordingPublisher {
    pub fn failing_for(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            published: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ArtifactPublisher for RecordingPublisher {
    async fn publish(
        &self,
        local_path: &Path,
        bucket: &str,
        key_prefix: &str,
    ) -> Result<String, UploadError> {
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if self.failing.contains(&name) {
            return Err(UploadError::Bucket {
                bucket: bucket.to_string(),
                message: "access denied".into(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((bucket.to_string(), format!("{key_prefix}/{name}")));
        Ok(format!("https://{bucket}.example.com/{key_prefix}/{name}"))
    }
}

/// In-memory queue capturing published messages.
#[derive(Default)]
pub struct MemoryQueue {
    pub messages: Mutex<Vec<JobMessage>>,
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn publish(&self, message: &JobMessage) -> Result<(), QueueError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn receive(&self, _timeout: Duration) -> Result<Option<JobMessage>, QueueError> {
        let mut messages = self.messages.lock().unwrap();
        Ok((!messages.is_empty()).then(|| messages.remove(0)))
    }
}

/// Rejects every publish.
pub struct FailingQueue;

#[async_trait]
impl JobQueue for FailingQueue {
    async fn publish(&self, _message: &JobMessage) -> Result<(), QueueError> {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        Err(QueueError::Encode(source))
    }

    async fn receive(&self, _timeout: Duration) -> Result<Option<JobMessage>, QueueError> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Knobs for [`build_test_app_with`].
pub struct TestOptions {
    pub optimizer: Arc<dyn Optimizer>,
    pub publisher: Option<Arc<dyn ArtifactPublisher>>,
    pub queue: Option<Arc<dyn JobQueue>>,
    pub worker_token: Option<String>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            optimizer: Arc::new(StubOptimizer::default()),
            publisher: None,
            queue: None,
            worker_token: None,
        }
    }
}

/// A router over a fresh store and a temporary data directory.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn JobStore>,
    pub layout: ArtifactLayout,
    pub supervisor: JobSupervisor,
    _data_dir: TempDir,
}

/// Build a test `ServerConfig` with safe defaults rooted at `data_dir`.
pub fn test_config(data_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        data_dir,
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        optimizer_url: "http://127.0.0.1:9".to_string(),
        optimizer_timeout_secs: 5,
        worker_token: None,
        storage: None,
        queue: None,
    }
}

pub fn test_storage() -> StorageConfig {
    StorageConfig {
        bucket: "resumes".into(),
        prefix: "outputs".into(),
        region: "us-east-1".into(),
        endpoint_url: None,
        auto_create_bucket: false,
    }
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(TestOptions::default())
}

/// Build the full application router (same middleware stack as `main.rs`)
/// with the given collaborators.
pub fn build_test_app_with(options: TestOptions) -> TestApp {
    let data_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(data_dir.path().to_path_buf());
    config.worker_token = options.worker_token;

    let layout = ArtifactLayout::new(data_dir.path());
    let mut runner = JobRunner::new(options.optimizer, layout.clone());
    if let Some(publisher) = options.publisher {
        runner = runner.with_publisher(publisher, test_storage());
    }

    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let supervisor = JobSupervisor::new();
    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::clone(&store),
        runner: Arc::new(runner),
        supervisor: supervisor.clone(),
        queue: options.queue,
        layout: layout.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        layout,
        supervisor,
        _data_dir: data_dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: &TestApp, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST an `application/x-www-form-urlencoded` body.
pub async fn post_form(app: &TestApp, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST text-only `multipart/form-data` fields, as `curl -F` sends them.
pub async fn post_multipart_fields(app: &TestApp, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
    let boundary = "resumeopt-form-boundary";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Job helpers
// ---------------------------------------------------------------------------

/// Create an inline job through `/optimize` and return its id.
pub async fn start_job(app: &TestApp) -> String {
    let response = post_form(app, "/optimize", "job_url=https%3A%2F%2Fjobs.example.com%2F1").await;
    assert_eq!(response.status(), 200);
    body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Poll the store until the job is terminal. Panics after 5 seconds.
pub async fn wait_for_terminal(app: &TestApp, job_id: &str) -> Job {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let job = app.store.get(job_id).await.unwrap();
        if job.status.is_terminal() {
            return job;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {job_id} still {} after 5s",
            job.status
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Multipart body with a single `file` part.
pub fn multipart_body(boundary: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

pub async fn upload(app: &TestApp, file_name: &str, content_type: &str, data: &[u8]) -> Response<Body> {
    let boundary = "resumeopt-test-boundary";
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload-resume")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body(boundary, file_name, content_type, data)))
        .unwrap();
    send(app, request).await
}

pub fn artifacts_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
