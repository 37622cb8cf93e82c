//! Status reports from the worker back to the API, with retry.
//!
//! Each report is a `POST <API_URL>/v1/jobs/<id>/status` carrying a
//! [`StatusReport`]. Transport failures and 5xx answers are retried with
//! exponential backoff (1 s, 2 s, 4 s). A 4xx answer means the API rejected
//! the report (unknown job, invalid transition, bad token) and is not retried.

use std::time::Duration;

use resumeopt_core::job::StatusReport;

/// Retry delays (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// HTTP request timeout for a single report attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const WORKER_TOKEN_HEADER: &str = "x-worker-token";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Status report returned HTTP {0}")]
    HttpStatus(u16),
}

impl ReportError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReportError::Request(_) => true,
            ReportError::HttpStatus(status) => *status >= 500,
        }
    }
}

// ---------------------------------------------------------------------------
// StatusReporter
// ---------------------------------------------------------------------------

pub struct StatusReporter {
    client: reqwest::Client,
    api_url: String,
    worker_token: Option<String>,
    retry_delays: Vec<Duration>,
}

impl StatusReporter {
    pub fn new(api_url: impl Into<String>, worker_token: Option<String>) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            worker_token,
            retry_delays: RETRY_DELAYS.to_vec(),
        })
    }

    /// Replace the backoff schedule.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    fn endpoint(&self, job_id: &str) -> String {
        format!("{}/v1/jobs/{job_id}/status", self.api_url)
    }

    /// Send a report, retrying transient failures.
    pub async fn report(&self, job_id: &str, report: &StatusReport) -> Result<(), ReportError> {
        let url = self.endpoint(job_id);

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(&url, report).await {
                Ok(()) => return Ok(()),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        job_id,
                        attempt = attempt + 1,
                        error = %e,
                        "Status report failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        self.try_send(&url, report).await.inspect_err(|e| {
            tracing::error!(job_id, error = %e, "Status report failed after all retries");
        })
    }

    async fn try_send(&self, url: &str, report: &StatusReport) -> Result<(), ReportError> {
        let mut request = self.client.post(url).json(report);
        if let Some(token) = &self.worker_token {
            request = request.header(WORKER_TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ReportError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fast(reporter: StatusReporter) -> StatusReporter {
        reporter.with_retry_delays(vec![Duration::from_millis(1); 3])
    }

    #[tokio::test]
    async fn posts_report_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/jobs/job-1/status"))
            .and(header("x-worker-token", "s3cret"))
            .and(body_partial_json(serde_json::json!({
                "status": "running",
                "progress": "Scoring",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let reporter = StatusReporter::new(server.uri(), Some("s3cret".into())).unwrap();
        reporter
            .report("job-1", &StatusReport::running("Scoring"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let reporter = fast(StatusReporter::new(server.uri(), None).unwrap());
        reporter
            .report("job-1", &StatusReport::failed("boom"))
            .await
            .unwrap();

        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let reporter = fast(StatusReporter::new(server.uri(), None).unwrap());
        let err = reporter
            .report("job-1", &StatusReport::running("Scoring"))
            .await
            .unwrap_err();

        assert_matches!(err, ReportError::HttpStatus(409));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_all_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let reporter = fast(StatusReporter::new(server.uri(), None).unwrap());
        let err = reporter
            .report("job-1", &StatusReport::running("Scoring"))
            .await
            .unwrap_err();

        assert_matches!(err, ReportError::HttpStatus(500));
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
    }

    #[test]
    fn report_error_display_http_status() {
        assert_eq!(
            ReportError::HttpStatus(502).to_string(),
            "Status report returned HTTP 502"
        );
    }
}
