use std::path::PathBuf;

use resumeopt_cloud::StorageConfig;
use resumeopt_queue::QueueConfig;

/// Default upper bound for uploaded resume bodies (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight jobs, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Root under which `knowledge/` and `output/` live (default: `.`).
    pub data_dir: PathBuf,
    /// Largest accepted request body for uploads.
    pub max_upload_bytes: usize,
    /// Base URL of the optimizer service.
    pub optimizer_url: String,
    /// Per-call timeout for the optimizer, in seconds (default: `600`).
    pub optimizer_timeout_secs: u64,
    /// Shared secret expected in `x-worker-token` on status reports. Unset
    /// means reports are accepted without a token.
    pub worker_token: Option<String>,
    /// Object storage; `None` keeps artifacts local only.
    pub storage: Option<StorageConfig>,
    /// Queue bridge; `None` keeps `/v1/jobs` in tracking-only mode.
    pub queue: Option<QueueConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `8000`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                       |
    /// | `DATA_DIR`               | `.`                        |
    /// | `MAX_UPLOAD_BYTES`       | `10485760`                 |
    /// | `OPTIMIZER_URL`          | `http://localhost:8001`    |
    /// | `OPTIMIZER_TIMEOUT_SECS` | `600`                      |
    /// | `WORKER_TOKEN`           | unset                      |
    ///
    /// Storage and queue settings are read by [`StorageConfig::from_env`] and
    /// [`QueueConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| ".".into()));

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .map(|v| v.parse().expect("MAX_UPLOAD_BYTES must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let optimizer_url =
            std::env::var("OPTIMIZER_URL").unwrap_or_else(|_| "http://localhost:8001".into());

        let optimizer_timeout_secs: u64 = std::env::var("OPTIMIZER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("OPTIMIZER_TIMEOUT_SECS must be a valid u64");

        let worker_token = std::env::var("WORKER_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            data_dir,
            max_upload_bytes,
            optimizer_url,
            optimizer_timeout_secs,
            worker_token,
            storage: StorageConfig::from_env(),
            queue: QueueConfig::from_env(),
        }
    }
}
