//! Stale-job sweeper
//!
//! Reclaims finished jobs that nobody has observed for a while, which is
//! the only way an archive that was never downloaded gets deleted.

use crate::storage::{remove_dir_best_effort, JobRegistry};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct StaleJobSweeper {
    registry: JobRegistry,
    interval: Duration,
    stale_after: Duration,
}

impl StaleJobSweeper {
    pub fn new(registry: JobRegistry, interval: Duration, stale_after: Duration) -> Self {
        Self {
            registry,
            interval,
            stale_after,
        }
    }

    /// Runs one pass and returns the number of jobs reclaimed
    ///
    /// Jobs still in progress are never touched. Directories are removed
    /// after the entries leave the registry, outside the lock.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let stale = self.registry.remove_stale(now, self.stale_after);

        for (id, job) in &stale {
            tracing::info!("Sweeping stale job {} ({})", id, job.status);
            if let Some(dir) = &job.scratch_dir {
                remove_dir_best_effort(dir).await;
            }
        }

        stale.len()
    }

    /// Sleeps, sweeps, and repeats until `shutdown` fires
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::debug!(
            "Sweeper started: every {:?}, stale after {:?}",
            self.interval,
            self.stale_after
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Sweeper stopping");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    let swept = self.sweep(Utc::now()).await;
                    if swept > 0 {
                        tracing::info!("Swept {} stale job(s)", swept);
                    }
                }
            }
        }
    }
}
