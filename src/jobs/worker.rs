//! Retrieval worker - downloads the assets of one job and archives them
//!
//! One worker runs per job, detached from the request that created it and
//! independent of every other worker. Each completed step is written to
//! the job's registry entry under the registry lock.

use crate::crawler::fetch_asset;
use crate::state::Job;
use crate::storage::{allocate_scratch_dir, build_archive, remove_dir_best_effort, JobRegistry};
use crate::url::file_name_for;
use crate::ScraperError;
use chrono::Utc;
use reqwest::Client;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Message recorded on jobs interrupted by shutdown
const SHUTDOWN_MESSAGE: &str = "server shutting down";

/// Downloads one asset into `files_dir`, named after its final path segment
pub async fn download_asset(
    client: &Client,
    url: &str,
    timeout: Duration,
    files_dir: &Path,
) -> Result<PathBuf, ScraperError> {
    let bytes = fetch_asset(client, url, timeout).await?;
    let path = files_dir.join(file_name_for(url));
    tokio::fs::write(&path, &bytes).await?;
    Ok(path)
}

/// Attempts every URL in order, collecting the files that were written
///
/// Failed assets are skipped. `after_attempt` runs after every attempt,
/// successful or not, and can stop the loop early; None is returned then.
/// A name downloaded twice keeps the later content and one list entry.
pub async fn download_all<F>(
    client: &Client,
    urls: &[String],
    timeout: Duration,
    files_dir: &Path,
    mut after_attempt: F,
) -> Option<Vec<PathBuf>>
where
    F: FnMut() -> ControlFlow<()>,
{
    let mut files: Vec<PathBuf> = Vec::new();

    for url in urls {
        match download_asset(client, url, timeout, files_dir).await {
            Ok(path) => {
                if !files.contains(&path) {
                    files.push(path);
                }
            }
            Err(e) => tracing::debug!("Skipping asset {}: {}", url, e),
        }

        if after_attempt().is_break() {
            return None;
        }
    }

    Some(files)
}

/// The worker of one retrieval job
pub struct RetrievalWorker {
    registry: JobRegistry,
    client: Client,
    scratch_root: PathBuf,
    asset_timeout: Duration,
    shutdown: CancellationToken,
}

impl RetrievalWorker {
    pub fn new(
        registry: JobRegistry,
        client: Client,
        scratch_root: PathBuf,
        asset_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            client,
            scratch_root,
            asset_timeout,
            shutdown,
        }
    }

    /// Runs the job to a terminal status
    ///
    /// # Procedure
    ///
    /// 1. Allocate a scratch directory and record it on the job
    /// 2. Attempt each URL in order, advancing `current` after every attempt
    /// 3. Switch to preparing the archive and build it from the downloaded files
    /// 4. Publish the archive path and size and mark the job ready
    ///
    /// A vanished registry entry is tolerated at every step; the worker then
    /// cleans up its own scratch directory since nobody else will.
    pub async fn run(self, job_id: String, urls: Vec<String>) {
        tracing::info!("Job {} started: {} asset(s)", job_id, urls.len());

        let scratch = match allocate_scratch_dir(&self.scratch_root, &job_id).await {
            Ok(scratch) => scratch,
            Err(e) => {
                self.fail(&job_id, format!("Failed to create scratch directory: {}", e));
                return;
            }
        };

        let dir = scratch.path().to_path_buf();
        if !self.apply(&job_id, |job| {
            job.attach_scratch_dir(dir, Utc::now());
            Ok(())
        }) {
            remove_dir_best_effort(scratch.path()).await;
            return;
        }

        let files_dir = scratch.files_dir();
        let downloaded = download_all(&self.client, &urls, self.asset_timeout, &files_dir, || {
            if self.shutdown.is_cancelled() {
                return ControlFlow::Break(());
            }
            self.apply(&job_id, |job| job.record_attempt(Utc::now()));
            ControlFlow::Continue(())
        })
        .await;

        let Some(files) = downloaded else {
            tracing::info!("Job {} interrupted by shutdown", job_id);
            self.fail(&job_id, SHUTDOWN_MESSAGE);
            remove_dir_best_effort(scratch.path()).await;
            return;
        };

        self.apply(&job_id, |job| job.begin_archive(Utc::now()));

        let archive_path = scratch.archive_path();
        let still_registered = match build_archive(archive_path.clone(), files.clone()).await {
            Ok(zip_size) => {
                tracing::info!(
                    "Job {} ready: {} of {} asset(s), {} bytes",
                    job_id,
                    files.len(),
                    urls.len(),
                    zip_size
                );
                self.apply(&job_id, |job| job.mark_ready(archive_path, zip_size, Utc::now()))
            }
            Err(e) => {
                tracing::error!("Job {} failed to build archive: {}", job_id, e);
                self.fail(&job_id, e.to_string())
            }
        };

        if !still_registered {
            remove_dir_best_effort(scratch.path()).await;
        }
    }

    /// Applies one step to the job; returns false if the job is gone
    fn apply(&self, job_id: &str, step: impl FnOnce(&mut Job) -> Result<(), ScraperError>) -> bool {
        match self.registry.update(job_id, step) {
            Some(Ok(())) => true,
            Some(Err(e)) => {
                tracing::warn!("Job {}: {}", job_id, e);
                true
            }
            None => {
                tracing::debug!("Job {} is no longer registered", job_id);
                false
            }
        }
    }

    fn fail(&self, job_id: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        self.apply(job_id, |job| job.mark_failed(message, Utc::now()))
    }
}
