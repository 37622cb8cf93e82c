//! Redis list implementation of [`JobQueue`].
//!
//! Producers `LPUSH` onto the list and consumers `BRPOP` from it, which gives
//! FIFO delivery. Delivery is at-most-once: a consumer that crashes after
//! popping a message loses it.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::QueueConfig;
use crate::message::JobMessage;
use crate::{JobQueue, QueueError};

pub struct RedisJobQueue {
    client: redis::Client,
    queue_name: String,
}

impl RedisJobQueue {
    /// Parse the connection string. No connection is made until first use.
    pub fn new(config: &QueueConfig) -> Result<Self, QueueError> {
        let client = redis::Client::open(config.url.as_str())?;
        Ok(Self {
            client,
            queue_name: config.queue_name.clone(),
        })
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn publish(&self, message: &JobMessage) -> Result<(), QueueError> {
        let payload = message.encode()?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let depth: i64 = redis::cmd("LPUSH")
            .arg(&self.queue_name)
            .arg(payload)
            .query_async(&mut conn)
            .await?;

        tracing::debug!(
            job_id = %message.job_id,
            queue = %self.queue_name,
            depth,
            "Job message published",
        );
        Ok(())
    }

    async fn receive(&self, timeout: Duration) -> Result<Option<JobMessage>, QueueError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // BRPOP returns nil on timeout, or a (list, value) pair.
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.queue_name)
            .arg(timeout.as_secs_f64())
            .query_async(&mut conn)
            .await?;

        match popped {
            Some((_, payload)) => JobMessage::decode(&payload).map(Some),
            None => Ok(None),
        }
    }
}
