//! Receive loop: pops messages off the broker and hands them to a
//! [`MessageHandler`] one at a time.

use std::sync::Arc;
use std::time::Duration;

use resumeopt_queue::{JobQueue, QueueError};
use tokio_util::sync::CancellationToken;

use crate::processor::MessageHandler;

/// Pause after a broker error before receiving again.
const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct Consumer {
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn MessageHandler>,
    wait: Duration,
    error_backoff: Duration,
}

impl Consumer {
    pub fn new(queue: Arc<dyn JobQueue>, handler: Arc<dyn MessageHandler>, wait: Duration) -> Self {
        Self {
            queue,
            handler,
            wait,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Run until `cancel` is triggered. A message already being handled is
    /// finished before the loop exits.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(wait_secs = self.wait.as_secs(), "Consumer started");

        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = self.queue.receive(self.wait) => received,
            };

            match received {
                Ok(Some(message)) => self.handler.handle(message).await,
                Ok(None) => continue,
                Err(QueueError::Decode { payload, source }) => {
                    tracing::warn!(payload = %payload, error = %source, "Dropping undecodable message");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Receive failed, backing off");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.error_backoff) => {}
                    }
                }
            }
        }

        tracing::info!("Consumer stopping");
    }
}
