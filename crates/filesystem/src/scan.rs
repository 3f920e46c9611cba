//! Output tree scanning.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::FileSystemError;
use crate::paths::{join_relative, to_posix_relative};

/// A regular file discovered under an asset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Absolute local path.
    pub full_path: PathBuf,
    /// Path relative to the asset root, `/`-separated.
    pub relative_path: String,
}

/// Collect every regular file under the given output directories of a root.
///
/// Symlinks are not followed and are not reported. Output directories that
/// do not exist are skipped. Results are sorted by relative path and contain
/// no duplicates even when output directories overlap.
///
/// # Arguments
/// * `root` - Local asset root
/// * `output_dirs` - `/`-separated directories relative to `root`
///
/// # Errors
/// Returns `FileSystemError::IoError` if a directory cannot be read, or a
/// path error if an output directory escapes `root`.
pub fn collect_output_files(
    root: &Path,
    output_dirs: &[String],
) -> Result<Vec<ScannedFile>, FileSystemError> {
    let mut files: Vec<ScannedFile> = Vec::new();

    for dir in output_dirs {
        let dir_path: PathBuf = if dir.is_empty() || dir == "." {
            root.to_path_buf()
        } else {
            join_relative(root, dir)?
        };

        if !dir_path.is_dir() {
            debug!("Output directory {} does not exist, skipping", dir_path.display());
            continue;
        }

        for entry in WalkDir::new(&dir_path).follow_links(false) {
            let entry: walkdir::DirEntry = entry.map_err(|e| {
                let path: String = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| dir_path.display().to_string());
                FileSystemError::io_error(path, std::io::Error::other(e.to_string()))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let full_path: PathBuf = entry.into_path();
            let relative_path: String = to_posix_relative(root, &full_path)?;
            files.push(ScannedFile {
                full_path,
                relative_path,
            });
        }
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    files.dedup_by(|a, b| a.relative_path == b.relative_path);
    Ok(files)
}
