//! Queue bridge: hands job payloads to an out-of-process worker through a
//! message broker instead of running them in the API process.
//!
//! - [`JobMessage`] is the wire payload.
//! - [`JobQueue`] is the broker seam used by the API (publish) and the
//!   worker (receive).
//! - [`RedisJobQueue`] implements it on a Redis list (`LPUSH` / `BRPOP`).

pub mod config;
pub mod message;
pub mod redis_queue;

use std::time::Duration;

use async_trait::async_trait;

pub use config::QueueConfig;
pub use message::JobMessage;
pub use redis_queue::RedisJobQueue;

/// Error type for broker operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The broker could not be reached or rejected the command.
    #[error("Broker error: {0}")]
    Broker(#[from] redis::RedisError),

    /// A message could not be encoded.
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// A received payload was not a valid [`JobMessage`].
    #[error("Failed to decode message: {source}")]
    Decode {
        payload: String,
        #[source]
        source: serde_json::Error,
    },
}

/// FIFO job queue on an external broker.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a message for the worker.
    async fn publish(&self, message: &JobMessage) -> Result<(), QueueError>;

    /// Wait up to `timeout` for the next message. `Ok(None)` on timeout.
    async fn receive(&self, timeout: Duration) -> Result<Option<JobMessage>, QueueError>;
}
