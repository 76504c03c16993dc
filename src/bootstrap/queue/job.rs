//! Job Contract
//!
//! A job is a serde struct with a stable name, an async `handle`, and retry
//! policy knobs. On enqueue the framework snapshots the struct's fields into
//! a `JobEnvelope`; on claim the worker looks the name up in the process-wide
//! `JobRegistry` and rebuilds the instance from the snapshot. Jobs therefore
//! must deserialize without constructor arguments, and should be idempotent.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{QueueError, QueueResult};

const DEFAULT_MAX_TRIES: u32 = 3;
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_QUEUE: &str = "default";

/// A unit of deferred work.
#[async_trait]
pub trait Job: Send + Sync + std::fmt::Debug {
    /// Stable identifier used to rebuild the job on the worker side.
    fn name(&self) -> &'static str;

    /// Queue the job is pushed onto.
    fn queue(&self) -> &str {
        DEFAULT_QUEUE
    }

    /// Total executions before the job is buried.
    fn max_tries(&self) -> u32 {
        DEFAULT_MAX_TRIES
    }

    /// Per-attempt execution timeout.
    fn timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)
    }

    /// Delay before a failed attempt becomes available again.
    fn retry_after(&self) -> Duration {
        Duration::ZERO
    }

    async fn handle(&self) -> anyhow::Result<()>;

    /// Invoked exactly once, after the final retry is exhausted. Errors are
    /// logged by the worker and do not prevent the bury.
    async fn on_failure(&self, _error: &anyhow::Error) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Serialized form of a job as stored by the queue drivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub id: String,
    /// Registered job name.
    pub job: String,
    /// Snapshot of the job struct's fields.
    pub data: Value,
    /// Executions already consumed.
    pub attempts: u32,
    pub queue: String,
}

impl JobEnvelope {
    /// Snapshot a job instance for enqueueing.
    pub fn wrap<J: Job + Serialize>(job: &J) -> QueueResult<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            job: job.name().to_string(),
            data: serde_json::to_value(job)?,
            attempts: 0,
            queue: job.queue().to_string(),
        })
    }

    pub fn encode(&self) -> QueueResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> QueueResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

type DecodeFn = fn(Value) -> Result<Box<dyn Job>, serde_json::Error>;

fn decode_as<J: Job + DeserializeOwned + 'static>(
    data: Value,
) -> Result<Box<dyn Job>, serde_json::Error> {
    Ok(Box::new(serde_json::from_value::<J>(data)?))
}

/// Process-wide mapping of job name to constructor. Built explicitly at
/// startup and carried in the application context.
#[derive(Default)]
pub struct JobRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<J: Job + DeserializeOwned + 'static>(&mut self, name: &str) {
        self.decoders.insert(name.to_string(), decode_as::<J>);
    }

    /// Rebuild a job instance from its envelope.
    pub fn decode(&self, envelope: &JobEnvelope) -> QueueResult<Box<dyn Job>> {
        let decoder = self
            .decoders
            .get(&envelope.job)
            .ok_or_else(|| QueueError::UnknownJob(envelope.job.clone()))?;
        Ok(decoder(envelope.data.clone())?)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }
}
