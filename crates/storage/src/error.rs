//! Error types for storage operations.

use thiserror::Error;

/// Errors reported by a [`StorageClient`](crate::StorageClient) for a single request.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Access denied for s3://{bucket}/{key}: {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Request throttled: {message}")]
    Throttled { message: String },

    #[error("Service unavailable (HTTP {status}): {message}")]
    ServiceUnavailable { status: u16, message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Request failed (HTTP {status}): {message}")]
    ClientError { status: u16, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error at {path}: {message}")]
    IoError { path: String, message: String },

    #[error("Storage error: {message}")]
    Other { message: String },
}

impl StorageError {
    /// Classify an HTTP status returned by the object store.
    ///
    /// # Arguments
    /// * `status` - HTTP status code of the failed request
    /// * `message` - Service error message
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message: String = message.into();
        match status {
            408 => StorageError::Timeout { message },
            429 => StorageError::Throttled { message },
            500..=599 => StorageError::ServiceUnavailable { status, message },
            _ => StorageError::ClientError { status, message },
        }
    }

    /// Whether another attempt of the same request may succeed.
    ///
    /// Throttling, server-side failures and timeouts are retryable. Everything
    /// else, including cancellation, is final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Throttled { .. }
                | StorageError::ServiceUnavailable { .. }
                | StorageError::Timeout { .. }
        )
    }
}

/// Outcome of a transfer after the retry policy has been applied.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Transfer of {key} failed after {attempts} attempts: {source}")]
    Exhausted {
        key: String,
        attempts: u32,
        #[source]
        source: StorageError,
    },

    #[error("Transfer of {key} failed: {source}")]
    Fatal {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Transfer of {key} was cancelled")]
    Cancelled { key: String },

    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    /// Object key the failed transfer targeted, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            TransferError::Exhausted { key, .. }
            | TransferError::Fatal { key, .. }
            | TransferError::Cancelled { key } => Some(key),
            TransferError::Io { .. } => None,
        }
    }

    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        TransferError::Io {
            path: path.into(),
            source,
        }
    }
}
