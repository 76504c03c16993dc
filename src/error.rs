//! Error types for the gateway framework

use thiserror::Error;

/// Errors raised while registering routes
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("invalid topic pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl RouteError {
    pub fn invalid(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by message dispatch
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no route matched topic '{0}'")]
    NoRoute(String),

    #[error("middleware on route '{route}' advanced the pipeline twice")]
    DoubleAdvance { route: String },

    #[error("handler for route '{route}' failed: {source}")]
    Handler {
        route: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors raised by the queue subsystem
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("job serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown job '{0}'")]
    UnknownJob(String),

    #[error("queue driver unavailable: {0}")]
    Unavailable(String),
}

impl QueueError {
    /// Backing-store failures are retried with backoff by the worker loop.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QueueError::Redis(_) | QueueError::Database(_) | QueueError::Unavailable(_)
        )
    }

    /// Decode failures bury the job immediately, with no retry.
    pub fn is_decode(&self) -> bool {
        matches!(self, QueueError::Serialization(_) | QueueError::UnknownJob(_))
    }
}

/// Result type alias for route registration
pub type RouteResult<T> = Result<T, RouteError>;

/// Result type alias for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
