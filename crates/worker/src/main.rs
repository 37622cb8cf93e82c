use std::sync::Arc;

use resumeopt_cloud::S3Publisher;
use resumeopt_core::artifacts::ArtifactLayout;
use resumeopt_queue::RedisJobQueue;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resumeopt_worker::config::WorkerConfig;
use resumeopt_worker::consumer::Consumer;
use resumeopt_worker::processor::Processor;
use resumeopt_worker::reporter::StatusReporter;
use resumeopt_worker::scoring::ScoringClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resumeopt_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();

    let Some(queue_config) = &config.queue else {
        tracing::warn!("QUEUE_URL or QUEUE_NAME not set, worker idle until shutdown");
        shutdown_signal().await;
        return;
    };

    let queue = RedisJobQueue::new(queue_config).expect("Invalid QUEUE_URL connection string");
    let scoring = ScoringClient::new(config.scoring_url.clone(), config.scoring_timeout)
        .expect("Failed to build scoring HTTP client");
    let reporter = StatusReporter::new(config.api_url.clone(), config.worker_token.clone())
        .expect("Failed to build status HTTP client");

    let mut processor = Processor::new(scoring, reporter, ArtifactLayout::new(config.data_dir.clone()));
    if let Some(storage) = &config.storage {
        let publisher = S3Publisher::from_config(storage).await;
        tracing::info!(bucket = %storage.bucket, "Result uploads enabled");
        processor = processor.with_publisher(Arc::new(publisher), storage.clone());
    }

    tracing::info!(
        queue = %queue_config.queue_name,
        scoring_url = %config.scoring_url,
        api_url = %config.api_url,
        "Worker starting",
    );

    let consumer = Consumer::new(Arc::new(queue), Arc::new(processor), config.receive_wait);
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        cancel_on_signal.cancel();
    });

    consumer.run(cancel).await;
    tracing::info!("Worker stopped");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
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
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
