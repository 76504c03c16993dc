//! Queue Driver Interface
//!
//! Shared contract for queue storage back-ends. A claimed job is represented
//! by a `ReservedJob` token, which carries everything a driver needs to ack,
//! release, or bury it. While reserved, a job is invisible to `pop` from any
//! other worker until one of those operations (or the stale sweep) runs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::JobEnvelope;
use crate::error::QueueResult;

/// A job claimed by a worker.
#[derive(Debug, Clone)]
pub struct ReservedJob {
    pub id: String,
    /// The stored payload blob, exactly as reserved.
    pub payload: String,
    /// Current attempt number, counting this claim.
    pub attempts: u32,
}

/// Record stored for a job that exhausted its retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedJobRecord {
    pub id: String,
    pub connection: String,
    pub queue: String,
    pub payload: String,
    pub exception: String,
    pub failed_at: DateTime<Utc>,
}

#[async_trait]
pub trait QueueDriver: Send + Sync {
    /// Place a job where it is immediately available.
    async fn push(&self, queue: &str, envelope: &JobEnvelope) -> QueueResult<()>;

    /// Batch push. Drivers with a batch primitive override this.
    async fn push_bulk(&self, queue: &str, envelopes: &[JobEnvelope]) -> QueueResult<()> {
        for envelope in envelopes {
            self.push(queue, envelope).await?;
        }
        Ok(())
    }

    /// Schedule a job to become available after `delay`.
    async fn later(&self, queue: &str, delay: Duration, envelope: &JobEnvelope) -> QueueResult<()>;

    /// Atomically claim one available job, or `None` when the queue is empty.
    async fn pop(&self, queue: &str) -> QueueResult<Option<ReservedJob>>;

    /// Ack a completed job.
    async fn delete(&self, queue: &str, job: &ReservedJob) -> QueueResult<()>;

    /// Return a failed job to the queue with its attempt recorded, available
    /// again after `delay`.
    async fn release(&self, queue: &str, job: &ReservedJob, delay: Duration) -> QueueResult<()>;

    /// Move a job to the failed-jobs store. Buried jobs are never
    /// re-dispatched.
    async fn bury(&self, queue: &str, job: &ReservedJob, exception: &str) -> QueueResult<()>;

    /// Count of currently-available, non-reserved jobs.
    async fn size(&self, queue: &str) -> QueueResult<u64>;
}
