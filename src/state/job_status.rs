/// Job status definitions for tracking retrieval progress
///
/// A job moves `Starting -> Downloading* -> PreparingArchive -> Ready`, or
/// reaches `Error` from any non-terminal status.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current status of a retrieval job
///
/// The serialized form is the human-readable label clients display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    // ===== Active States =====
    /// Job is registered; its worker has not attempted any asset yet
    #[serde(rename = "starting")]
    Starting,

    /// Worker is attempting assets one at a time
    #[serde(rename = "Downloading Files")]
    Downloading,

    /// All assets attempted; the archive is being written
    #[serde(rename = "Preparing ZIP...")]
    PreparingArchive,

    // ===== Terminal States =====
    /// Archive is built and can be fetched
    #[serde(rename = "ready")]
    Ready,

    /// Job failed outside the per-asset downloads
    #[serde(rename = "error")]
    Error,
}

impl JobStatus {
    /// Returns true if the worker is done with this job
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Returns true if the worker still owns this job
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if `next` is a legal successor of this status
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match (self, next) {
            (Self::Starting, Self::Downloading | Self::PreparingArchive) => true,
            (Self::Downloading, Self::Downloading | Self::PreparingArchive) => true,
            (Self::PreparingArchive, Self::Ready) => true,
            (from, Self::Error) => from.is_active(),
            _ => false,
        }
    }

    /// The label shown to clients
    pub fn label(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Downloading => "Downloading Files",
            Self::PreparingArchive => "Preparing ZIP...",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    /// Returns all possible job statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Starting,
            Self::Downloading,
            Self::PreparingArchive,
            Self::Ready,
            Self::Error,
        ]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
