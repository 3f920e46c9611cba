//! Streaming content hashing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use asset_sync_model::{ContentHasher, HashAlgorithm};

use crate::error::FileSystemError;
use crate::stat::FileStat;

/// Read buffer size for streamed hashing.
pub const HASH_READ_CHUNK_SIZE: usize = 1024 * 1024;

/// Result of hashing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHash {
    /// Content hash, hex encoded.
    pub hash: String,
    /// File size in bytes.
    pub size: u64,
    /// Modification time in microseconds since epoch.
    pub mtime_us: i64,
}

/// Hash a file's content without loading it into memory.
///
/// Size and mtime are captured before reading, matching what a manifest
/// records for the file.
///
/// # Arguments
/// * `path` - File to hash
/// * `algorithm` - Algorithm of the manifest this hash will be recorded in
///
/// # Errors
/// - `FileSystemError::PathNotFound` if the path is missing or not a regular file
/// - `FileSystemError::IoError` on read failure
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<FileHash, FileSystemError> {
    let stat: FileStat = FileStat::read(path)?.ok_or_else(|| FileSystemError::PathNotFound {
        path: path.display().to_string(),
    })?;

    let mut file: File =
        File::open(path).map_err(|e| FileSystemError::io_error(path.display().to_string(), e))?;
    let mut hasher: ContentHasher = algorithm.hasher();
    let mut buffer: Vec<u8> = vec![0u8; HASH_READ_CHUNK_SIZE];

    loop {
        let read: usize = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FileSystemError::io_error(path.display().to_string(), e)),
        };
        hasher.update(&buffer[..read]);
    }

    Ok(FileHash {
        hash: hasher.finish(),
        size: stat.size,
        mtime_us: stat.mtime_us,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_hash_file_matches_hash_bytes() {
        let dir: TempDir = TempDir::new().unwrap();
        let file_path: PathBuf = dir.path().join("data.bin");
        let data: Vec<u8> = (0..(HASH_READ_CHUNK_SIZE * 2 + 17))
            .map(|i| (i % 253) as u8)
            .collect();
        std::fs::write(&file_path, &data).unwrap();

        let result: FileHash = hash_file(&file_path, HashAlgorithm::Xxh128).unwrap();
        assert_eq!(result.hash, HashAlgorithm::Xxh128.hash_bytes(&data));
        assert_eq!(result.size, data.len() as u64);
    }

    #[test]
    fn test_hash_empty_file() {
        let dir: TempDir = TempDir::new().unwrap();
        let file_path: PathBuf = dir.path().join("empty");
        std::fs::write(&file_path, b"").unwrap();

        let result: FileHash = hash_file(&file_path, HashAlgorithm::Xxh128).unwrap();
        assert_eq!(result.size, 0);
        assert_eq!(result.hash, HashAlgorithm::Xxh128.hash_bytes(b""));
    }

    #[test]
    fn test_hash_missing_file() {
        let dir: TempDir = TempDir::new().unwrap();
        let result = hash_file(&dir.path().join("nope"), HashAlgorithm::Xxh128);
        assert!(matches!(result, Err(FileSystemError::PathNotFound { .. })));
    }
}
