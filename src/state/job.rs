use crate::state::JobStatus;
use crate::ScraperError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Registry record of one retrieval job
///
/// Mutated only by the job's worker until it reaches a terminal status;
/// after that it is read by clients and deleted by the archive fetch, an
/// explicit discard or the stale-job sweeper.
#[derive(Debug, Clone)]
pub struct Job {
    pub status: JobStatus,

    /// Assets attempted so far (successful or not)
    pub current: usize,

    /// Assets requested
    pub total: usize,

    /// Archive size in bytes once built
    pub zip_size: u64,

    /// Name the archive is offered under
    pub zip_name: String,

    pub error: Option<String>,
    pub ready: bool,

    /// Scratch directory owned by the worker
    pub scratch_dir: Option<PathBuf>,

    /// Archive path once built
    pub archive_path: Option<PathBuf>,

    /// Last time the worker or a client touched this job
    pub last_activity: DateTime<Utc>,
}

/// Client-facing view of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub current: usize,
    pub total: usize,
    pub zip_size: u64,
    pub zip_name: String,
    pub error: Option<String>,
    pub ready: bool,
    pub last_update: DateTime<Utc>,
}

impl Job {
    /// Creates a job in the `Starting` status
    pub fn new(total: usize, zip_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Starting,
            current: 0,
            total,
            zip_size: 0,
            zip_name: zip_name.into(),
            error: None,
            ready: false,
            scratch_dir: None,
            archive_path: None,
            last_activity: now,
        }
    }

    /// Moves to `next`, rejecting transitions the state machine forbids
    pub fn transition(&mut self, next: JobStatus, now: DateTime<Utc>) -> Result<(), ScraperError> {
        if !self.status.can_transition_to(next) {
            return Err(ScraperError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.last_activity = now;
        Ok(())
    }

    /// Records the worker's scratch directory
    pub fn attach_scratch_dir(&mut self, dir: PathBuf, now: DateTime<Utc>) {
        self.scratch_dir = Some(dir);
        self.last_activity = now;
    }

    /// Counts one asset attempt, whatever its outcome
    pub fn record_attempt(&mut self, now: DateTime<Utc>) -> Result<(), ScraperError> {
        self.transition(JobStatus::Downloading, now)?;
        self.current = (self.current + 1).min(self.total);
        Ok(())
    }

    pub fn begin_archive(&mut self, now: DateTime<Utc>) -> Result<(), ScraperError> {
        self.transition(JobStatus::PreparingArchive, now)
    }

    /// Publishes the built archive
    pub fn mark_ready(
        &mut self,
        archive_path: PathBuf,
        zip_size: u64,
        now: DateTime<Utc>,
    ) -> Result<(), ScraperError> {
        self.transition(JobStatus::Ready, now)?;
        self.archive_path = Some(archive_path);
        self.zip_size = zip_size;
        self.ready = true;
        Ok(())
    }

    /// Fails the job with a message
    pub fn mark_failed(
        &mut self,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ScraperError> {
        self.transition(JobStatus::Error, now)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Refreshes the last-activity stamp
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    /// Returns true while the worker still owns the job
    pub fn is_in_progress(&self) -> bool {
        self.status.is_active()
    }

    /// Returns true if the job is finished and unobserved for longer than `stale_after`
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        if self.is_in_progress() {
            return false;
        }
        match (now - self.last_activity).to_std() {
            Ok(idle) => idle > stale_after,
            // last activity is in the future
            Err(_) => false,
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            status: self.status,
            current: self.current,
            total: self.total,
            zip_size: self.zip_size,
            zip_name: self.zip_name.clone(),
            error: self.error.clone(),
            ready: self.ready,
            last_update: self.last_activity,
        }
    }
}

impl JobSnapshot {
    /// Returns true once no further snapshot can differ from this one
    pub fn is_final(&self) -> bool {
        self.ready || self.error.is_some() || self.status.is_terminal()
    }
}
