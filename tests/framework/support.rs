//! Shared test fixtures: an in-process queue driver, a recording publisher,
//! and context helpers.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;

use mqtt_gateway::bootstrap::queue::driver::{FailedJobRecord, QueueDriver, ReservedJob};
use mqtt_gateway::bootstrap::queue::job::{JobEnvelope, JobRegistry};
use mqtt_gateway::bootstrap::queue::QueueManager;
use mqtt_gateway::bootstrap::session::client::Publisher;
use mqtt_gateway::error::QueueResult;
use mqtt_gateway::router::QoS;
use mqtt_gateway::AppContext;

/// Publisher that records everything it is asked to send.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        _qos: QoS,
        _retain: bool,
    ) -> anyhow::Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}

#[derive(Default)]
struct DriverState {
    pending: HashMap<String, VecDeque<String>>,
    delayed: HashMap<String, Vec<(Instant, String)>>,
    /// queue -> reserved blobs keyed by the blob itself
    reserved: HashMap<String, Vec<String>>,
    failed: Vec<FailedJobRecord>,
}

/// In-process queue driver with the same reservation semantics as the real
/// back-ends: a claimed blob is invisible to other `pop`s until it is
/// deleted, released, or buried.
#[derive(Default)]
pub struct MemoryDriver {
    state: Mutex<DriverState>,
}

impl MemoryDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failed(&self) -> Vec<FailedJobRecord> {
        self.state.lock().unwrap().failed.clone()
    }

    pub fn reserved_count(&self, queue: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .reserved
            .get(queue)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl QueueDriver for MemoryDriver {
    async fn push(&self, queue: &str, envelope: &JobEnvelope) -> QueueResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .pending
            .entry(queue.to_string())
            .or_default()
            .push_back(envelope.encode()?);
        Ok(())
    }

    async fn later(&self, queue: &str, delay: Duration, envelope: &JobEnvelope) -> QueueResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .delayed
            .entry(queue.to_string())
            .or_default()
            .push((Instant::now() + delay, envelope.encode()?));
        Ok(())
    }

    async fn pop(&self, queue: &str) -> QueueResult<Option<ReservedJob>> {
        let mut state = self.state.lock().unwrap();

        // Migrate due delayed entries first.
        let now = Instant::now();
        if let Some(delayed) = state.delayed.remove(queue) {
            let (due, waiting): (Vec<_>, Vec<_>) =
                delayed.into_iter().partition(|(at, _)| *at <= now);
            let pending = state.pending.entry(queue.to_string()).or_default();
            for (_, blob) in due {
                pending.push_back(blob);
            }
            if !waiting.is_empty() {
                state.delayed.insert(queue.to_string(), waiting);
            }
        }

        let Some(blob) = state
            .pending
            .get_mut(queue)
            .and_then(VecDeque::pop_front)
        else {
            return Ok(None);
        };

        state
            .reserved
            .entry(queue.to_string())
            .or_default()
            .push(blob.clone());

        let envelope = JobEnvelope::decode(&blob)?;
        Ok(Some(ReservedJob {
            id: envelope.id,
            attempts: envelope.attempts + 1,
            payload: blob,
        }))
    }

    async fn delete(&self, queue: &str, job: &ReservedJob) -> QueueResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(reserved) = state.reserved.get_mut(queue) {
            reserved.retain(|blob| blob != &job.payload);
        }
        Ok(())
    }

    async fn release(&self, queue: &str, job: &ReservedJob, delay: Duration) -> QueueResult<()> {
        let mut envelope = JobEnvelope::decode(&job.payload)?;
        envelope.attempts = job.attempts;
        let blob = envelope.encode()?;

        let mut state = self.state.lock().unwrap();
        if let Some(reserved) = state.reserved.get_mut(queue) {
            reserved.retain(|b| b != &job.payload);
        }
        if delay.is_zero() {
            state
                .pending
                .entry(queue.to_string())
                .or_default()
                .push_back(blob);
        } else {
            state
                .delayed
                .entry(queue.to_string())
                .or_default()
                .push((Instant::now() + delay, blob));
        }
        Ok(())
    }

    async fn bury(&self, queue: &str, job: &ReservedJob, exception: &str) -> QueueResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(reserved) = state.reserved.get_mut(queue) {
            reserved.retain(|blob| blob != &job.payload);
        }
        state.failed.push(FailedJobRecord {
            id: job.id.clone(),
            connection: "memory".to_string(),
            queue: queue.to_string(),
            payload: job.payload.clone(),
            exception: exception.to_string(),
            failed_at: Utc::now(),
        });
        Ok(())
    }

    async fn size(&self, queue: &str) -> QueueResult<u64> {
        let state = self.state.lock().unwrap();
        let now = Instant::now();
        let pending = state.pending.get(queue).map_or(0, VecDeque::len);
        let due = state
            .delayed
            .get(queue)
            .map_or(0, |d| d.iter().filter(|(at, _)| *at <= now).count());
        Ok((pending + due) as u64)
    }
}

/// Application context over the in-process driver, for tests that exercise
/// route files or the queue manager.
pub fn test_context(driver: Arc<MemoryDriver>, registry: JobRegistry) -> AppContext {
    AppContext::new(
        Arc::new(QueueManager::with_driver(driver)),
        Arc::new(registry),
    )
}
