//! Asynchronous retrieval jobs
//!
//! The [`JobSupervisor`] owns every background task of the service: one
//! retrieval worker per job and the stale-job sweeper. Tasks are tracked
//! so shutdown can stop them and wait for them to finish.

mod progress;
mod sweeper;
mod worker;

pub use progress::{progress_stream, ProgressEvent};
pub use sweeper::StaleJobSweeper;
pub use worker::{download_all, download_asset, RetrievalWorker};

use crate::config::Config;
use crate::storage::{allocate_scratch_dir, build_archive, remove_dir_best_effort, JobRegistry, ScratchDir};
use crate::ScraperError;
use futures::Stream;
use reqwest::Client;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

/// Tunables shared by workers, streams and the sweeper
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub scratch_root: PathBuf,
    pub asset_timeout: Duration,
    pub poll_interval: Duration,
    pub sweep_interval: Duration,
    pub stale_after: Duration,
}

impl JobSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scratch_root: config.jobs.scratch_root(),
            asset_timeout: config.fetch.asset_timeout(),
            poll_interval: config.jobs.poll_interval(),
            sweep_interval: config.jobs.sweep_interval(),
            stale_after: config.jobs.stale_after(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobSupervisor {
    registry: JobRegistry,
    client: Client,
    settings: JobSettings,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl JobSupervisor {
    pub fn new(registry: JobRegistry, client: Client, settings: JobSettings) -> Self {
        Self {
            registry,
            client,
            settings,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Registers a job and starts its worker; returns the job identifier
    pub fn start_job(&self, urls: Vec<String>, zip_name: String) -> String {
        let job_id = self.registry.create(urls.len(), zip_name);
        tracing::info!("Created job {} for {} asset(s)", job_id, urls.len());

        let worker = RetrievalWorker::new(
            self.registry.clone(),
            self.client.clone(),
            self.settings.scratch_root.clone(),
            self.settings.asset_timeout,
            self.shutdown.clone(),
        );
        self.tracker.spawn(worker.run(job_id.clone(), urls));

        job_id
    }

    /// Starts the stale-job sweeper; call once at startup
    pub fn start_sweeper(&self) {
        let sweeper = StaleJobSweeper::new(
            self.registry.clone(),
            self.settings.sweep_interval,
            self.settings.stale_after,
        );
        self.tracker.spawn(sweeper.run(self.shutdown.clone()));
    }

    /// Progress snapshots of one job
    pub fn progress(&self, job_id: String) -> impl Stream<Item = ProgressEvent> + Send + 'static {
        progress_stream(self.registry.clone(), job_id, self.settings.poll_interval)
    }

    /// Downloads `urls` and archives them without registering a job
    ///
    /// The caller owns the returned scratch directory and must remove it
    /// once the archive has been sent.
    pub async fn download_bundle(&self, urls: &[String]) -> Result<ScratchDir, ScraperError> {
        let bundle_id = Uuid::new_v4().to_string();
        let scratch = allocate_scratch_dir(&self.settings.scratch_root, &bundle_id).await?;

        let files = download_all(
            &self.client,
            urls,
            self.settings.asset_timeout,
            &scratch.files_dir(),
            || ControlFlow::Continue(()),
        )
        .await
        .unwrap_or_default();

        match build_archive(scratch.archive_path(), files).await {
            Ok(size) => {
                tracing::debug!("Bundle {} built: {} bytes", bundle_id, size);
                Ok(scratch)
            }
            Err(e) => {
                remove_dir_best_effort(scratch.path()).await;
                Err(e.into())
            }
        }
    }

    /// Stops every background task and waits for them to finish
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("Background tasks stopped");
    }
}
