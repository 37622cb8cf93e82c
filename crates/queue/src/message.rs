use serde::{Deserialize, Serialize};

use crate::QueueError;

/// Payload published for each queue-bridge job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    pub job_id: String,
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
}

impl JobMessage {
    pub fn encode(&self) -> Result<String, QueueError> {
        serde_json::to_string(self).map_err(QueueError::Encode)
    }

    pub fn decode(payload: &str) -> Result<Self, QueueError> {
        serde_json::from_str(payload).map_err(|source| QueueError::Decode {
            payload: payload.to_string(),
            source,
        })
    }

    /// Resume text with surrounding whitespace removed; empty when absent.
    pub fn resume_text(&self) -> &str {
        self.resume_text.as_deref().map(str::trim).unwrap_or("")
    }

    /// Job description with surrounding whitespace removed; empty when absent.
    pub fn job_description(&self) -> &str {
        self.job_description.as_deref().map(str::trim).unwrap_or("")
    }
}
