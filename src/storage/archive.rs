//! ZIP archive construction

use crate::ArchiveError;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes every file in `files` into a flat archive at `archive_path`
///
/// Entries are named after the files' own names. Entries of 4 GiB or more
/// are written with ZIP64 headers. Returns the archive size in bytes.
pub fn build_archive_blocking(archive_path: &Path, files: &[PathBuf]) -> Result<u64, ArchiveError> {
    let mut writer = ZipWriter::new(BufWriter::new(File::create(archive_path)?));

    for path in files {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let mut source = File::open(path)?;
        let large = source.metadata()?.len() >= u64::from(u32::MAX);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(large);

        writer.start_file(name, options)?;
        io::copy(&mut source, &mut writer)?;
    }

    let mut inner = writer.finish()?;
    io::Write::flush(&mut inner)?;
    drop(inner);

    Ok(std::fs::metadata(archive_path)?.len())
}

/// Builds the archive on the blocking thread pool
pub async fn build_archive(archive_path: PathBuf, files: Vec<PathBuf>) -> Result<u64, ArchiveError> {
    tokio::task::spawn_blocking(move || build_archive_blocking(&archive_path, &files))
        .await
        .map_err(|e| ArchiveError::Task(e.to_string()))?
}
