//! Queue Module
//!
//! Driver-abstracted background job queue: the `QueueManager` facade selects
//! the configured driver and exposes dispatch/later/bulk/size, the drivers
//! implement the storage semantics, and `QueueWorker` runs the
//! claim-execute-retry-bury loop.

pub mod database_driver;
pub mod driver;
pub mod job;
pub mod redis_driver;
pub mod worker;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use self::database_driver::DatabaseQueue;
use self::driver::QueueDriver;
use self::job::{Job, JobEnvelope};
use self::redis_driver::RedisQueue;
use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};

pub use self::driver::{FailedJobRecord, ReservedJob};
pub use self::job::{JobRegistry, DEFAULT_QUEUE};
pub use self::worker::{QueueWorker, QueueWorkerOptions, WorkerReport};

/// Driver-selection facade for enqueueing work.
pub struct QueueManager {
    driver: Arc<dyn QueueDriver>,
    connection: String,
}

impl QueueManager {
    /// Connect the driver named by `QUEUE_CONNECTION`.
    pub async fn connect() -> QueueResult<Self> {
        Self::connect_named(QueueConfig::connection()).await
    }

    /// Connect a specific driver by name.
    pub async fn connect_named(name: &str) -> QueueResult<Self> {
        let driver: Arc<dyn QueueDriver> = match name {
            "redis" => Arc::new(RedisQueue::connect().await?),
            "database" => Arc::new(DatabaseQueue::connect().await?),
            other => {
                return Err(QueueError::Unavailable(format!(
                    "unknown queue connection '{}'",
                    other
                )))
            }
        };
        Ok(Self {
            driver,
            connection: name.to_string(),
        })
    }

    /// Wrap an existing driver. Tests use this to plug in their own.
    pub fn with_driver(driver: Arc<dyn QueueDriver>) -> Self {
        Self {
            driver,
            connection: "custom".to_string(),
        }
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn driver(&self) -> Arc<dyn QueueDriver> {
        self.driver.clone()
    }

    /// Enqueue a job for immediate execution. Returns the assigned job id.
    pub async fn dispatch<J: Job + Serialize>(&self, job: &J) -> QueueResult<String> {
        let envelope = JobEnvelope::wrap(job)?;
        self.driver.push(job.queue(), &envelope).await?;
        Ok(envelope.id)
    }

    /// Enqueue a job onto an explicit queue, overriding the job's own.
    pub async fn push_to<J: Job + Serialize>(&self, job: &J, queue: &str) -> QueueResult<String> {
        let mut envelope = JobEnvelope::wrap(job)?;
        envelope.queue = queue.to_string();
        self.driver.push(queue, &envelope).await?;
        Ok(envelope.id)
    }

    /// Enqueue a job to become available after `delay`.
    pub async fn later<J: Job + Serialize>(
        &self,
        delay: Duration,
        job: &J,
    ) -> QueueResult<String> {
        let envelope = JobEnvelope::wrap(job)?;
        self.driver.later(job.queue(), delay, &envelope).await?;
        Ok(envelope.id)
    }

    /// Enqueue a batch, using the driver's batch primitive per queue.
    pub async fn bulk<J: Job + Serialize>(&self, jobs: &[J]) -> QueueResult<Vec<String>> {
        let mut ids = Vec::with_capacity(jobs.len());
        let mut by_queue: HashMap<String, Vec<JobEnvelope>> = HashMap::new();

        for job in jobs {
            let envelope = JobEnvelope::wrap(job)?;
            ids.push(envelope.id.clone());
            by_queue.entry(job.queue().to_string()).or_default().push(envelope);
        }

        for (queue, envelopes) in &by_queue {
            self.driver.push_bulk(queue, envelopes).await?;
        }
        Ok(ids)
    }

    /// Count of currently-available jobs on a queue.
    pub async fn size(&self, queue: &str) -> QueueResult<u64> {
        self.driver.size(queue).await
    }
}
