/// Default key prefix for uploaded artifacts.
pub const DEFAULT_PREFIX: &str = "resume-optimiser/outputs";

/// Region used when neither `AWS_REGION` nor `AWS_DEFAULT_REGION` is set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Object storage settings. Present only when `S3_BUCKET_NAME` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Destination bucket.
    pub bucket: String,
    /// Key prefix; each job's artifacts land under `<prefix>/<job_id>/`.
    pub prefix: String,
    /// Bucket region.
    pub region: String,
    /// Custom endpoint (e.g. MinIO). Enables path-style addressing.
    pub endpoint_url: Option<String>,
    /// Create the bucket on first upload if it does not exist.
    pub auto_create_bucket: bool,
}

impl StorageConfig {
    /// Load storage settings from environment variables.
    ///
    /// | Env Var                 | Default                     |
    /// |-------------------------|-----------------------------|
    /// | `S3_BUCKET_NAME`        | unset (uploads disabled)    |
    /// | `S3_PREFIX`             | `resume-optimiser/outputs`  |
    /// | `AWS_REGION`            | `AWS_DEFAULT_REGION`, then `us-east-1` |
    /// | `S3_ENDPOINT_URL`       | unset                       |
    /// | `S3_AUTO_CREATE_BUCKET` | `false`                     |
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let bucket = non_empty("S3_BUCKET_NAME")?;
        let prefix = non_empty("S3_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.into());
        let region = non_empty("AWS_REGION")
            .or_else(|| non_empty("AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.into());
        let endpoint_url = non_empty("S3_ENDPOINT_URL");
        let auto_create_bucket = non_empty("S3_AUTO_CREATE_BUCKET")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Some(Self {
            bucket,
            prefix,
            region,
            endpoint_url,
            auto_create_bucket,
        })
    }

    /// Key prefix for one job's artifacts.
    pub fn job_prefix(&self, job_id: &str) -> String {
        format!("{}/{job_id}", self.prefix.trim_end_matches('/'))
    }
}

/// `1`, `true`, and `yes` (any case) are truthy; everything else is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
