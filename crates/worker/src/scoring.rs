//! HTTP client for the resume ML scoring service.
//!
//! Endpoints (all `POST`, JSON in and out):
//!
//! ```text
//! /parse_resume     {"text": ...}
//! /extract_skills   {"text": ...}
//! /score_match      {"resume_text": ..., "job_description": ...}
//! ```

use std::time::Duration;

use resumeopt_queue::JobMessage;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::WorkerError;

/// Everything the scoring service returned for one message. Absent parts
/// were not requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoringResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Value>,
}

pub struct ScoringClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScoringClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WorkerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn parse_resume(&self, text: &str) -> Result<Value, WorkerError> {
        self.call("parse_resume", json!({ "text": text })).await
    }

    pub async fn extract_skills(&self, text: &str) -> Result<Value, WorkerError> {
        self.call("extract_skills", json!({ "text": text })).await
    }

    pub async fn score_match(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<Value, WorkerError> {
        self.call(
            "score_match",
            json!({ "resume_text": resume_text, "job_description": job_description }),
        )
        .await
    }

    /// Run every call the message's inputs allow. Resume parsing and skill
    /// extraction need resume text; matching needs either text.
    pub async fn score(&self, message: &JobMessage) -> Result<ScoringResults, WorkerError> {
        let resume_text = message.resume_text();
        let job_description = message.job_description();
        let mut results = ScoringResults::default();

        if !resume_text.is_empty() {
            results.parsed = Some(self.parse_resume(resume_text).await?);
            results.skills = Some(self.extract_skills(resume_text).await?);
        }
        if !resume_text.is_empty() || !job_description.is_empty() {
            results.score = Some(self.score_match(resume_text, job_description).await?);
        }

        Ok(results)
    }

    async fn call(&self, endpoint: &'static str, body: Value) -> Result<Value, WorkerError> {
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn message(resume: Option<&str>, jd: Option<&str>) -> JobMessage {
        JobMessage {
            job_id: "job-1".into(),
            resume_text: resume.map(str::to_string),
            job_description: jd.map(str::to_string),
        }
    }

    async fn mount(server: &MockServer, endpoint: &str, reply: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/{endpoint}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn resume_and_description_run_all_calls() {
        let server = MockServer::start().await;
        mount(&server, "parse_resume", json!({ "sections": {} })).await;
        mount(&server, "extract_skills", json!({ "skills": ["rust"] })).await;
        Mock::given(method("POST"))
            .and(path("/score_match"))
            .and(body_json(json!({
                "resume_text": "Rust engineer",
                "job_description": "Rust backend role",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "score": 0.5 })))
            .mount(&server)
            .await;

        let client = ScoringClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let results = client
            .score(&message(Some(" Rust engineer "), Some("Rust backend role")))
            .await
            .unwrap();

        assert_eq!(results.skills, Some(json!({ "skills": ["rust"] })));
        assert_eq!(results.score, Some(json!({ "score": 0.5 })));
        assert!(results.parsed.is_some());
    }

    #[tokio::test]
    async fn description_only_skips_resume_calls() {
        let server = MockServer::start().await;
        mount(&server, "score_match", json!({ "score": 0.0 })).await;

        let client = ScoringClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let results = client
            .score(&message(None, Some("Backend role")))
            .await
            .unwrap();

        assert!(results.parsed.is_none());
        assert!(results.skills.is_none());
        assert_eq!(results.score, Some(json!({ "score": 0.0 })));

        let serialized = serde_json::to_value(&results).unwrap();
        assert_eq!(serialized, json!({ "score": { "score": 0.0 } }));
    }

    #[tokio::test]
    async fn service_error_is_reported_with_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse_resume"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = ScoringClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = client
            .score(&message(Some("Rust"), None))
            .await
            .unwrap_err();

        assert_matches!(
            err,
            WorkerError::Status {
                endpoint: "parse_resume",
                status: 503
            }
        );
    }
}
