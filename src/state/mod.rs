//! State module for retrieval jobs
//!
//! # Components
//!
//! - `JobStatus`: The job state machine (starting, downloading, preparing archive, ready, error)
//! - `Job`: The full registry record of one retrieval job
//! - `JobSnapshot`: The client-facing view pushed by progress streams

mod job;
mod job_status;

// Re-export main types
pub use job::{Job, JobSnapshot};
pub use job_status::JobStatus;
