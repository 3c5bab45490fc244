//! Storage module for in-flight retrieval jobs
//!
//! This module handles everything a job keeps while it exists:
//! - The job registry, the single lock-guarded map shared by workers,
//!   progress streams, request handlers and the sweeper
//! - Per-job scratch directories and their best-effort removal
//! - Building the ZIP archive from downloaded files
//!
//! Nothing here survives a process restart.

mod archive;
mod registry;
mod scratch;

pub use archive::{build_archive, build_archive_blocking};
pub use registry::{DiscardOutcome, JobRegistry, ReadyArchive};
pub use scratch::{allocate_scratch_dir, remove_dir_best_effort, ScratchDir, ARCHIVE_FILE_NAME};
