//! Process-wide job registry
//!
//! One mutex guards the whole map and every entry's fields. Contention is
//! low: each job has a single writer and a handful of readers polling a
//! couple of times per second.

use crate::state::{Job, JobSnapshot};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

/// What a finished archive fetch needs, copied out of the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyArchive {
    pub archive_path: PathBuf,
    pub zip_name: String,
    pub scratch_dir: Option<PathBuf>,
}

/// Result of discarding a job without fetching its archive
#[derive(Debug)]
pub enum DiscardOutcome {
    Removed(Job),
    InProgress,
    NotFound,
}

/// Shared map from job identifier to job record
///
/// Cloning the registry clones a handle; all clones see the same map.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<String, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Job>> {
        // Every mutation is one closure over one job, so a poisoned map is still consistent
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new job in the `Starting` status and returns its identifier
    pub fn create(&self, total: usize, zip_name: impl Into<String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.lock()
            .insert(id.clone(), Job::new(total, zip_name, Utc::now()));
        id
    }

    /// Inserts a job under a caller-chosen identifier
    pub fn insert(&self, id: impl Into<String>, job: Job) {
        self.lock().insert(id.into(), job);
    }

    /// Applies `f` to a job under the lock
    ///
    /// Returns None if the job is no longer registered.
    pub fn update<T>(&self, id: &str, f: impl FnOnce(&mut Job) -> T) -> Option<T> {
        self.lock().get_mut(id).map(f)
    }

    /// Returns the current snapshot of a job
    pub fn snapshot(&self, id: &str) -> Option<JobSnapshot> {
        self.lock().get(id).map(Job::snapshot)
    }

    /// Returns a snapshot and counts the read as client activity
    pub fn observe(&self, id: &str, now: DateTime<Utc>) -> Option<JobSnapshot> {
        self.lock().get_mut(id).map(|job| {
            job.touch(now);
            job.snapshot()
        })
    }

    /// Archive name of a ready job
    pub fn ready_name(&self, id: &str) -> Option<String> {
        self.lock()
            .get(id)
            .filter(|job| job.ready)
            .map(|job| job.zip_name.clone())
    }

    /// Archive location of a ready job
    pub fn ready_archive(&self, id: &str) -> Option<ReadyArchive> {
        let jobs = self.lock();
        let job = jobs.get(id).filter(|job| job.ready)?;
        Some(ReadyArchive {
            archive_path: job.archive_path.clone()?,
            zip_name: job.zip_name.clone(),
            scratch_dir: job.scratch_dir.clone(),
        })
    }

    /// Removes a job unconditionally
    pub fn remove(&self, id: &str) -> Option<Job> {
        self.lock().remove(id)
    }

    /// Removes a job only if its worker has finished with it
    pub fn discard(&self, id: &str) -> DiscardOutcome {
        let mut jobs = self.lock();
        match jobs.get(id) {
            None => DiscardOutcome::NotFound,
            Some(job) if job.is_in_progress() => DiscardOutcome::InProgress,
            Some(_) => match jobs.remove(id) {
                Some(job) => DiscardOutcome::Removed(job),
                None => DiscardOutcome::NotFound,
            },
        }
    }

    /// Removes every finished job idle for longer than `stale_after`
    ///
    /// The removed records are returned so the caller can release their
    /// scratch directories outside the lock.
    pub fn remove_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> Vec<(String, Job)> {
        let mut jobs = self.lock();
        let stale: Vec<String> = jobs
            .iter()
            .filter(|(_, job)| job.is_stale(now, stale_after))
            .map(|(id, _)| id.clone())
            .collect();

        stale
            .into_iter()
            .filter_map(|id| jobs.remove(&id).map(|job| (id, job)))
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
