/// Opaque job identifier (a UUID v4 rendered as a string).
pub type JobId = String;

/// All timestamps are stored and serialized as UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
