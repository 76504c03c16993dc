//! Queue Worker Loop
//!
//! Long-running claim-execute-retry-bury loop. Single task, cooperative: one
//! job at a time, each execution bounded by the job's timeout. Failures
//! release the job for retry until `max_tries`, then invoke `on_failure` and
//! bury it. Store outages are treated as transient and retried with backoff.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::driver::{QueueDriver, ReservedJob};
use super::job::{JobEnvelope, JobRegistry, DEFAULT_QUEUE};
use crate::bootstrap::backoff::Backoff;
use crate::config::QueueConfig;

pub struct QueueWorkerOptions {
    pub queue: String,
    /// Idle sleep when `pop` comes back empty.
    pub sleep: Duration,
    /// Stop after claiming this many jobs.
    pub max_jobs: Option<u64>,
    /// Stop after running for this long.
    pub max_time: Option<Duration>,
    /// Override every job's own timeout.
    pub timeout_override: Option<Duration>,
}

impl Default for QueueWorkerOptions {
    fn default() -> Self {
        Self {
            queue: DEFAULT_QUEUE.to_string(),
            sleep: Duration::from_secs(QueueConfig::sleep_seconds()),
            max_jobs: None,
            max_time: None,
            timeout_override: None,
        }
    }
}

/// Counters reported when the loop stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerReport {
    /// Jobs claimed.
    pub processed: u64,
    pub succeeded: u64,
    pub released: u64,
    pub buried: u64,
}

pub struct QueueWorker {
    driver: Arc<dyn QueueDriver>,
    registry: Arc<JobRegistry>,
    options: QueueWorkerOptions,
}

impl QueueWorker {
    pub fn new(
        driver: Arc<dyn QueueDriver>,
        registry: Arc<JobRegistry>,
        options: QueueWorkerOptions,
    ) -> Self {
        Self {
            driver,
            registry,
            options,
        }
    }

    /// Run until the shutdown token fires or a configured limit is reached.
    /// An in-flight job is never abandoned: shutdown waits for it to finish
    /// (bounded by its timeout).
    pub async fn run(&self, shutdown: CancellationToken) -> WorkerReport {
        let started = Instant::now();
        let mut report = WorkerReport::default();
        let mut backoff = Backoff::new();

        info!(queue = %self.options.queue, "queue worker started");

        loop {
            if shutdown.is_cancelled() {
                break;
            }
            if let Some(max) = self.options.max_jobs {
                if report.processed >= max {
                    info!(max, "reached max jobs, stopping");
                    break;
                }
            }
            if let Some(max) = self.options.max_time {
                if started.elapsed() >= max {
                    info!(?max, "reached max time, stopping");
                    break;
                }
            }

            let reserved = match self.driver.pop(&self.options.queue).await {
                Ok(reserved) => {
                    backoff.reset();
                    reserved
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "queue store unavailable, backing off");
                    self.idle(&shutdown, backoff.next_delay()).await;
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "queue worker stopping on unrecoverable error");
                    break;
                }
            };

            let Some(reserved) = reserved else {
                self.idle(&shutdown, self.options.sleep).await;
                continue;
            };

            report.processed += 1;
            self.process(reserved, &mut report).await;
        }

        info!(
            queue = %self.options.queue,
            processed = report.processed,
            succeeded = report.succeeded,
            released = report.released,
            buried = report.buried,
            "queue worker stopped"
        );
        report
    }

    async fn process(&self, reserved: ReservedJob, report: &mut WorkerReport) {
        let queue = &self.options.queue;

        let envelope = match JobEnvelope::decode(&reserved.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(job_id = %reserved.id, error = %e, "burying undecodable payload");
                self.bury(&reserved, &format!("payload decode failed: {}", e)).await;
                report.buried += 1;
                return;
            }
        };

        let job = match self.registry.decode(&envelope) {
            Ok(job) => job,
            Err(e) => {
                warn!(job = %envelope.job, job_id = %envelope.id, error = %e, "burying unknown job");
                self.bury(&reserved, &format!("job decode failed: {}", e)).await;
                report.buried += 1;
                return;
            }
        };

        let timeout = self.options.timeout_override.unwrap_or_else(|| job.timeout());
        info!(
            job = %envelope.job,
            job_id = %envelope.id,
            attempt = reserved.attempts,
            "executing job"
        );

        let error = match tokio::time::timeout(timeout, job.handle()).await {
            Ok(Ok(())) => {
                if let Err(e) = self.driver.delete(queue, &reserved).await {
                    error!(job_id = %envelope.id, error = %e, "failed to ack completed job");
                }
                info!(job = %envelope.job, job_id = %envelope.id, "job completed");
                report.succeeded += 1;
                return;
            }
            Ok(Err(e)) => e,
            Err(_) => anyhow::anyhow!("job '{}' timed out after {:?}", envelope.job, timeout),
        };

        if reserved.attempts < job.max_tries() {
            warn!(
                job = %envelope.job,
                job_id = %envelope.id,
                attempt = reserved.attempts,
                max_tries = job.max_tries(),
                error = %error,
                "job failed, releasing for retry"
            );
            if let Err(e) = self.driver.release(queue, &reserved, job.retry_after()).await {
                error!(job_id = %envelope.id, error = %e, "failed to release job");
            }
            report.released += 1;
        } else {
            error!(
                job = %envelope.job,
                job_id = %envelope.id,
                attempt = reserved.attempts,
                error = %error,
                "job exhausted retries, burying"
            );
            if let Err(e) = job.on_failure(&error).await {
                error!(job = %envelope.job, job_id = %envelope.id, error = %e, "on_failure hook failed");
            }
            self.bury(&reserved, &format!("{:?}", error)).await;
            report.buried += 1;
        }
    }

    async fn bury(&self, reserved: &ReservedJob, exception: &str) {
        if let Err(e) = self
            .driver
            .bury(&self.options.queue, reserved, exception)
            .await
        {
            error!(job_id = %reserved.id, error = %e, "failed to bury job");
        }
    }

    /// Sleep, waking early on shutdown.
    async fn idle(&self, shutdown: &CancellationToken, duration: Duration) {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}
