//! Artifact publishing to external object storage.
//!
//! The [`ArtifactPublisher`] trait is the seam the job runner and the queue
//! worker publish through; [`S3Publisher`] is the production implementation.
//! Publish failures are reported as [`UploadError`] and are never fatal to a
//! job: callers log them and leave the file out of the uploaded locators.

pub mod config;
pub mod error;
pub mod s3;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use config::StorageConfig;
pub use error::UploadError;
pub use s3::S3Publisher;

/// Transfers a local file to object storage and returns a stable locator.
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// Upload `local_path` to `bucket` under `key_prefix` and return its URL.
    async fn publish(
        &self,
        local_path: &Path,
        bucket: &str,
        key_prefix: &str,
    ) -> Result<String, UploadError>;
}

/// Publish every artifact of one job, skipping the ones that fail.
///
/// Returns file name -> URL for the successful uploads only. Each failure is
/// logged at `warn` and otherwise ignored.
pub async fn publish_all(
    publisher: &dyn ArtifactPublisher,
    storage: &StorageConfig,
    job_id: &str,
    files: &BTreeMap<String, PathBuf>,
) -> BTreeMap<String, String> {
    let prefix = storage.job_prefix(job_id);
    let mut locators = BTreeMap::new();

    for (name, path) in files {
        match publisher.publish(path, &storage.bucket, &prefix).await {
            Ok(url) => {
                locators.insert(name.clone(), url);
            }
            Err(e) => {
                tracing::warn!(
                    job_id,
                    file = %name,
                    error = %e,
                    "Artifact upload failed, continuing without it",
                );
            }
        }
    }

    locators
}

/// Object key for a file under a prefix: `<prefix>/<file name>`.
pub fn object_key(key_prefix: &str, file_name: &str) -> String {
    let prefix = key_prefix.trim_end_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{prefix}/{file_name}")
    }
}

/// Content type used for an uploaded artifact, by extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    if file_name.ends_with(".md") {
        "text/markdown"
    } else if file_name.ends_with(".json") {
        "application/json"
    } else {
        "text/plain"
    }
}
