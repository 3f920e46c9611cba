//! File stat capture.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use filetime::FileTime;

use crate::error::FileSystemError;

/// Size and modification time of a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// File size in bytes.
    pub size: u64,
    /// Modification time in microseconds since Unix epoch.
    pub mtime_us: i64,
}

impl FileStat {
    /// Stat a file without following symlinks.
    ///
    /// # Returns
    /// `Ok(None)` if nothing exists at `path` or it is not a regular file.
    ///
    /// # Errors
    /// Returns `FileSystemError::IoError` for failures other than not-found.
    pub fn read(path: &Path) -> Result<Option<FileStat>, FileSystemError> {
        let metadata: std::fs::Metadata = match path.symlink_metadata() {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FileSystemError::io_error(path.display().to_string(), e)),
        };

        if !metadata.file_type().is_file() {
            return Ok(None);
        }

        let modified: SystemTime = metadata
            .modified()
            .map_err(|e| FileSystemError::io_error(path.display().to_string(), e))?;

        Ok(Some(FileStat {
            size: metadata.len(),
            mtime_us: system_time_to_micros(modified),
        }))
    }
}

/// Convert a `SystemTime` to microseconds since the Unix epoch, truncating.
pub fn system_time_to_micros(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_micros() as i64,
        Err(e) => -(e.duration().as_micros() as i64),
    }
}

/// Set a file's modification time from microseconds since the Unix epoch.
///
/// # Errors
/// Returns `FileSystemError::IoError` if the timestamp cannot be applied.
pub fn set_mtime_us(path: &Path, mtime_us: i64) -> Result<(), FileSystemError> {
    let seconds: i64 = mtime_us.div_euclid(1_000_000);
    let nanos: u32 = (mtime_us.rem_euclid(1_000_000) * 1_000) as u32;
    filetime::set_file_mtime(path, FileTime::from_unix_time(seconds, nanos))
        .map_err(|e| FileSystemError::io_error(path.display().to_string(), e))
}
