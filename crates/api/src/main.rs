use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use resumeopt_cloud::S3Publisher;
use resumeopt_core::artifacts::ArtifactLayout;
use resumeopt_core::store::{InMemoryJobStore, JobStore};
use resumeopt_queue::{JobQueue, RedisJobQueue};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resumeopt_api::config::ServerConfig;
use resumeopt_api::engine::{HttpOptimizer, JobRunner, JobSupervisor};
use resumeopt_api::router::build_app_router;
use resumeopt_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resumeopt_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        data_dir = %config.data_dir.display(),
        "Loaded server configuration",
    );

    let layout = ArtifactLayout::new(config.data_dir.clone());

    // --- Optimizer collaborator ---
    let optimizer = HttpOptimizer::new(
        config.optimizer_url.clone(),
        Duration::from_secs(config.optimizer_timeout_secs),
    )
    .expect("Failed to build optimizer HTTP client");
    tracing::info!(url = %config.optimizer_url, "Optimizer client ready");

    // --- Runner (with optional object storage) ---
    let mut runner = JobRunner::new(Arc::new(optimizer), layout.clone());
    match &config.storage {
        Some(storage) => {
            let publisher = S3Publisher::from_config(storage).await;
            tracing::info!(
                bucket = %storage.bucket,
                prefix = %storage.prefix,
                auto_create = storage.auto_create_bucket,
                "Artifact uploads enabled",
            );
            runner = runner.with_publisher(Arc::new(publisher), storage.clone());
        }
        None => tracing::info!("S3_BUCKET_NAME not set, artifacts stay local"),
    }

    // --- Queue bridge ---
    let queue: Option<Arc<dyn JobQueue>> = match &config.queue {
        Some(queue_config) => {
            let queue =
                RedisJobQueue::new(queue_config).expect("Invalid QUEUE_URL connection string");
            tracing::info!(queue = %queue_config.queue_name, "Queue bridge enabled");
            Some(Arc::new(queue))
        }
        None => {
            tracing::info!("Queue bridge not configured, /v1/jobs tracks jobs only");
            None
        }
    };

    // --- App state ---
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let supervisor = JobSupervisor::new();
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        runner: Arc::new(runner),
        supervisor: supervisor.clone(),
        queue,
        layout,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining jobs");

    let drained = supervisor
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    if drained {
        tracing::info!("Graceful shutdown complete");
    } else {
        tracing::warn!("Shutdown finished with jobs still running; their state is lost");
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
