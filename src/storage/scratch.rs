//! Scratch directories for downloaded assets and built archives
//!
//! Layout of one scratch directory:
//!
//! ```text
//! <root>/audiobreak-<id>/
//!     files/         downloaded assets, one per archive entry
//!     archive.zip    the built archive
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// Archive file name inside a scratch directory
pub const ARCHIVE_FILE_NAME: &str = "archive.zip";

const FILES_DIR_NAME: &str = "files";
const SCRATCH_PREFIX: &str = "audiobreak-";

/// A private scratch directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// The scratch directory itself
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Directory holding downloaded assets
    pub fn files_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR_NAME)
    }

    /// Where the archive is written
    pub fn archive_path(&self) -> PathBuf {
        self.root.join(ARCHIVE_FILE_NAME)
    }
}

/// Creates a fresh scratch directory under `root`
pub async fn allocate_scratch_dir(root: &Path, id: &str) -> io::Result<ScratchDir> {
    let scratch = ScratchDir {
        root: root.join(format!("{}{}", SCRATCH_PREFIX, id)),
    };
    tokio::fs::create_dir_all(scratch.files_dir()).await?;
    tracing::debug!("Allocated scratch directory {}", scratch.root.display());
    Ok(scratch)
}

/// Deletes a directory tree, logging instead of propagating failures
///
/// Deletion may race between a worker, the archive fetch and the sweeper,
/// so a directory that is already gone is not a failure.
pub async fn remove_dir_best_effort(dir: &Path) {
    match tokio::fs::try_exists(dir).await {
        Ok(false) => return,
        Ok(true) => {}
        Err(e) => {
            tracing::warn!("Could not check scratch directory {}: {}", dir.display(), e);
            return;
        }
    }

    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => tracing::debug!("Removed scratch directory {}", dir.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove scratch directory {}: {}", dir.display(), e),
    }
}
