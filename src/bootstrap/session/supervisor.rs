//! Worker Supervisor
//!
//! Spawns one OS process per shared-route worker slot, so CPU-bound handlers
//! get real parallelism and a crashing worker cannot take its siblings down.
//! Each child runs this same binary with the internal `worker` subcommand
//! and rebuilds its own route table on startup.

use std::process::ExitStatus;
use std::time::Duration;

use futures::future::join_all;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::AppConfig;

const RESPAWN_DELAY: Duration = Duration::from_secs(1);
const HEALTH_INTERVAL: Duration = Duration::from_secs(1);

struct WorkerChild {
    index: usize,
    child: Child,
}

/// Liveness snapshot for one worker slot.
pub struct WorkerHealth {
    pub index: usize,
    pub alive: bool,
}

pub struct WorkerSupervisor {
    children: Vec<WorkerChild>,
    grace: Duration,
}

impl WorkerSupervisor {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            grace: Duration::from_secs(AppConfig::worker_grace_seconds()),
        }
    }

    /// Spawn `count` worker processes.
    pub fn start(&mut self, count: usize) -> anyhow::Result<()> {
        info!(count, "starting worker processes");
        for index in 0..count {
            let child = spawn_worker(index)?;
            self.children.push(WorkerChild { index, child });
        }
        Ok(())
    }

    /// Non-blocking liveness check of every worker slot.
    pub fn health(&mut self) -> Vec<WorkerHealth> {
        self.children
            .iter_mut()
            .map(|w| WorkerHealth {
                index: w.index,
                alive: matches!(w.child.try_wait(), Ok(None)),
            })
            .collect()
    }

    /// Orderly shutdown: signal every worker, wait out the grace period,
    /// force-kill stragglers.
    pub async fn stop(&mut self) {
        info!("stopping worker processes");
        for worker in &mut self.children {
            request_termination(&mut worker.child);
        }

        let grace = self.grace;
        let waits = self.children.iter_mut().map(|worker| async move {
            match tokio::time::timeout(grace, worker.child.wait()).await {
                Ok(Ok(status)) => {
                    info!(worker = worker.index, ?status, "worker exited");
                }
                Ok(Err(e)) => {
                    error!(worker = worker.index, error = %e, "failed waiting for worker");
                }
                Err(_) => {
                    warn!(worker = worker.index, "worker did not exit in time, killing");
                    worker.child.kill().await.ok();
                }
            }
        });
        join_all(waits).await;
        self.children.clear();
    }

    /// Replace crashed workers until the shutdown token fires, then stop the
    /// pool. An exit status of zero is an orderly shutdown and the slot is
    /// retired; anything else is a crash and the slot is respawned.
    pub async fn supervise(&mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    self.stop().await;
                    return;
                }
                _ = tokio::time::sleep(HEALTH_INTERVAL) => {
                    self.reap_and_respawn().await;
                }
            }
        }
    }

    async fn reap_and_respawn(&mut self) {
        let mut respawn: Vec<usize> = Vec::new();

        self.children.retain_mut(|worker| match worker.child.try_wait() {
            Ok(Some(status)) => {
                if crashed(&status) {
                    warn!(worker = worker.index, ?status, "worker crashed");
                    respawn.push(worker.index);
                } else {
                    info!(worker = worker.index, "worker exited cleanly");
                }
                false
            }
            Ok(None) => true,
            Err(e) => {
                error!(worker = worker.index, error = %e, "failed to poll worker");
                true
            }
        });

        for index in respawn {
            tokio::time::sleep(RESPAWN_DELAY).await;
            match spawn_worker(index) {
                Ok(child) => {
                    info!(worker = index, "worker respawned");
                    self.children.push(WorkerChild { index, child });
                }
                Err(e) => error!(worker = index, error = %e, "failed to respawn worker"),
            }
        }
    }
}

impl Default for WorkerSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

fn crashed(status: &ExitStatus) -> bool {
    !status.success()
}

fn spawn_worker(index: usize) -> anyhow::Result<Child> {
    let exe = std::env::current_exe()?;
    let child = Command::new(exe)
        .arg("worker")
        .arg("--index")
        .arg(index.to_string())
        .kill_on_drop(true)
        .spawn()?;
    Ok(child)
}

/// Ask a worker to shut down. SIGTERM on unix so it can disconnect cleanly;
/// elsewhere the best available option is a hard kill.
fn request_termination(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            return;
        }
    }

    child.start_kill().ok();
}
