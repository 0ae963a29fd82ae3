use invite_core::error::CoreError;
use invite_events::EmailError;

/// Failure of the queue backend itself.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Queue is closed")]
    Closed,
}

/// Errors returned to the submitter before anything is queued.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Failed to serialize job payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Terminal failure of a single job. Only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Malformed job payload: {0}")]
    Payload(serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] EmailError),

    #[error("Job cancelled after soft time limit of {limit_secs}s")]
    Cancelled { limit_secs: u64 },

    #[error("Job exceeded hard time limit of {limit_secs}s")]
    TimedOut { limit_secs: u64 },
}

/// Invalid worker configuration, detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Soft limit ({soft_secs}s) must be shorter than hard limit ({hard_secs}s)")]
    Limits { soft_secs: u64, hard_secs: u64 },

    #[error("{0}")]
    Invalid(String),
}
