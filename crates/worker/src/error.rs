/// Failure while processing one job message. Fatal to that job only.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The scoring service could not be reached or its reply was not JSON.
    #[error("Scoring request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The scoring service answered with a non-2xx status.
    #[error("Scoring service returned HTTP {status} for {endpoint}")]
    Status { endpoint: &'static str, status: u16 },

    /// Writing the results file failed.
    #[error("Failed to write results: {0}")]
    Io(#[from] std::io::Error),

    /// The results could not be serialized.
    #[error("Failed to encode results: {0}")]
    Encode(#[from] serde_json::Error),
}
