/// Broker settings. The bridge is enabled only when both are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Broker connection string, e.g. `redis://localhost:6379/0`.
    pub url: String,
    /// Name of the list jobs are pushed onto.
    pub queue_name: String,
}

impl QueueConfig {
    /// Load broker settings from `QUEUE_URL` and `QUEUE_NAME`.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        Some(Self {
            url: non_empty("QUEUE_URL")?,
            queue_name: non_empty("QUEUE_NAME")?,
        })
    }
}
