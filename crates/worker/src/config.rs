use std::path::PathBuf;
use std::time::Duration;

use resumeopt_cloud::StorageConfig;
use resumeopt_queue::QueueConfig;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Broker settings. `None` leaves the worker idle.
    pub queue: Option<QueueConfig>,
    /// Base URL of the resume ML scoring service.
    pub scoring_url: String,
    /// Per-call timeout for the scoring service.
    pub scoring_timeout: Duration,
    /// Base URL of the API the worker reports status to.
    pub api_url: String,
    /// Sent as `x-worker-token` on status reports when set.
    pub worker_token: Option<String>,
    /// Shared data root; results land in `<DATA_DIR>/output/run-<job_id>/`.
    pub data_dir: PathBuf,
    /// How long one `BRPOP` waits before looping.
    pub receive_wait: Duration,
    /// Object storage; `None` keeps results local only.
    pub storage: Option<StorageConfig>,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `QUEUE_URL`            | unset (worker idles)     |
    /// | `QUEUE_NAME`           | unset (worker idles)     |
    /// | `SCORING_URL`          | `http://localhost:3000`  |
    /// | `SCORING_TIMEOUT_SECS` | `10`                     |
    /// | `API_URL`              | `http://localhost:8000`  |
    /// | `WORKER_TOKEN`         | unset                    |
    /// | `DATA_DIR`             | `.`                      |
    /// | `RECEIVE_WAIT_SECS`    | `5`                      |
    pub fn from_env() -> Self {
        let scoring_url =
            std::env::var("SCORING_URL").unwrap_or_else(|_| "http://localhost:3000".into());

        let scoring_timeout_secs: u64 = std::env::var("SCORING_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SCORING_TIMEOUT_SECS must be a valid u64");

        let api_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:8000".into());

        let worker_token = std::env::var("WORKER_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| ".".into()));

        let receive_wait_secs: u64 = std::env::var("RECEIVE_WAIT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("RECEIVE_WAIT_SECS must be a valid u64");

        Self {
            queue: QueueConfig::from_env(),
            scoring_url,
            scoring_timeout: Duration::from_secs(scoring_timeout_secs),
            api_url,
            worker_token,
            data_dir,
            receive_wait: Duration::from_secs(receive_wait_secs),
            storage: StorageConfig::from_env(),
        }
    }
}
