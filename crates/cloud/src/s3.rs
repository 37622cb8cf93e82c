//! S3-backed [`ArtifactPublisher`].

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client as S3Client;
use tokio::sync::Mutex;

use crate::config::{StorageConfig, DEFAULT_REGION};
use crate::error::UploadError;
use crate::{content_type_for, object_key, ArtifactPublisher};

/// Publishes artifacts with `PutObject` and returns their object URL.
pub struct S3Publisher {
    client: S3Client,
    region: String,
    endpoint_url: Option<String>,
    auto_create_bucket: bool,
    /// Buckets already confirmed or created by this publisher.
    ensured: Mutex<HashSet<String>>,
}

impl S3Publisher {
    /// Build a publisher using the default AWS credential chain
    /// (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`,
    /// profiles, instance metadata).
    pub async fn from_config(config: &StorageConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::with_client(
            S3Client::from_conf(builder.build()),
            config.region.clone(),
            config.endpoint_url.clone(),
            config.auto_create_bucket,
        )
    }

    pub fn with_client(
        client: S3Client,
        region: String,
        endpoint_url: Option<String>,
        auto_create_bucket: bool,
    ) -> Self {
        Self {
            client,
            region,
            endpoint_url,
            auto_create_bucket,
            ensured: Mutex::new(HashSet::new()),
        }
    }

    /// Public URL for an object.
    ///
    /// Virtual-hosted style on AWS; path style under a custom endpoint.
    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!("{}/{bucket}/{key}", endpoint.trim_end_matches('/')),
            None => format!("https://{bucket}.s3.{}.amazonaws.com/{key}", self.region),
        }
    }

    /// Make sure `bucket` exists, creating it when it does not.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), UploadError> {
        let mut ensured = self.ensured.lock().await;
        if ensured.contains(bucket) {
            return Ok(());
        }

        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {}
            Err(err) => {
                let status = err.raw_response().map(|r| r.status().as_u16());
                let not_found = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);
                if !head_bucket_means_absent(status, not_found) {
                    return Err(UploadError::Bucket {
                        bucket: bucket.to_string(),
                        message: DisplayErrorContext(&err).to_string(),
                    });
                }
                self.create_bucket(bucket).await?;
            }
        }

        ensured.insert(bucket.to_string());
        Ok(())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), UploadError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        // us-east-1 rejects an explicit location constraint.
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                tracing::info!(bucket, region = %self.region, "Created artifact bucket");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_bucket_already_owned_by_you())
                    .unwrap_or(false) =>
            {
                Ok(())
            }
            Err(err) => Err(UploadError::Bucket {
                bucket: bucket.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            }),
        }
    }
}

/// `HeadBucket` outcomes that lead to a create attempt: not found, or a 301
/// for a bucket addressed through the wrong region.
fn head_bucket_means_absent(status: Option<u16>, not_found: bool) -> bool {
    not_found || matches!(status, Some(404 | 301))
}

#[async_trait]
impl ArtifactPublisher for S3Publisher {
    async fn publish(
        &self,
        local_path: &Path,
        bucket: &str,
        key_prefix: &str,
    ) -> Result<String, UploadError> {
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::SourceMissing(local_path.to_path_buf()))?;

        let data = match tokio::fs::read(local_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(UploadError::SourceMissing(local_path.to_path_buf()));
            }
            Err(source) => {
                return Err(UploadError::Read {
                    path: local_path.to_path_buf(),
                    source,
                });
            }
        };

        if self.auto_create_bucket {
            self.ensure_bucket(bucket).await?;
        }

        let key = object_key(key_prefix, file_name);
        self.client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .content_type(content_type_for(file_name))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|err| UploadError::Transfer {
                path: local_path.to_path_buf(),
                bucket: bucket.to_string(),
                key: key.clone(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        tracing::debug!(bucket, key = %key, "Artifact uploaded");
        Ok(self.object_url(bucket, &key))
    }
}
