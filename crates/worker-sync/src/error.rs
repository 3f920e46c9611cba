//! Error types for worker sync operations.

use asset_sync_filesystem::FileSystemError;
use asset_sync_model::ManifestError;
use asset_sync_storage::TransferError;
use thiserror::Error;

use crate::mount::MountError;

/// Failure reported by the job or queue service.
#[derive(Debug, Error)]
#[error("Metadata service error: {message}")]
pub struct MetadataError {
    pub message: String,
}

impl MetadataError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that can occur during input or output sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A manifest could not be decoded, encoded or merged.
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Fetched manifest content does not match the recorded hash.
    #[error("Manifest {key} has hash {actual}, expected {expected}")]
    ManifestHashMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    /// File system error.
    #[error("File system error: {0}")]
    FileSystem(#[from] FileSystemError),

    /// A store request failed, was exhausted or was cancelled.
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// The mount helper was found but could not mount.
    #[error("Mount error: {0}")]
    Mount(#[from] MountError),

    /// Metadata service error.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// The progress reporter asked to stop.
    #[error("Operation cancelled")]
    Cancelled,

    /// IO error outside a transfer.
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A blocking worker panicked or was aborted.
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure was a cancellation rather than an error.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            SyncError::Cancelled | SyncError::Transfer(TransferError::Cancelled { .. })
        )
    }
}
