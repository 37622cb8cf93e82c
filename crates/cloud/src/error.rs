use std::path::PathBuf;

/// Failure to publish a single artifact.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The local file to upload does not exist.
    #[error("Local file not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// The local file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bucket could not be checked or created.
    #[error("Bucket '{bucket}' unavailable: {message}")]
    Bucket { bucket: String, message: String },

    /// The transfer itself failed (unreachable endpoint, bad credentials, ...).
    #[error("Failed to upload {} to s3://{bucket}/{key}: {message}", path.display())]
    Transfer {
        path: PathBuf,
        bucket: String,
        key: String,
        message: String,
    },
}
