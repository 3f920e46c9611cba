//! Object store client contract.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::TransferProgress;

/// Callback trait for progress reporting.
pub trait ProgressCallback: Send + Sync {
    /// Called with progress updates.
    /// Returns false to cancel the operation.
    fn on_progress(&self, progress: &TransferProgress) -> bool;
}

impl<F> ProgressCallback for F
where
    F: Fn(&TransferProgress) -> bool + Send + Sync,
{
    fn on_progress(&self, progress: &TransferProgress) -> bool {
        self(progress)
    }
}

/// Information about an object from list operations.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds).
    pub last_modified: Option<i64>,
}

/// Extended object metadata from HEAD operations.
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    /// Object size in bytes.
    pub size: u64,
    /// Content type.
    pub content_type: Option<String>,
    /// User-defined metadata (x-amz-meta-* headers).
    pub user_metadata: HashMap<String, String>,
}

/// Low-level object store operations, implemented by each backend.
///
/// Implementations report progress through the callback where one is given
/// and return `StorageError::Cancelled` as soon as it returns false. Failures
/// are classified through [`StorageError::is_retryable`]; retrying is the
/// caller's job.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Check if an object exists and return its size.
    /// Returns None if object doesn't exist.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<u64>, StorageError>;

    /// Get object metadata including user-defined metadata.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `key` - Object key
    ///
    /// # Returns
    /// None if the object doesn't exist.
    async fn head_object_with_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectMetadata>, StorageError>;

    /// Upload bytes.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<(), StorageError>;

    /// Upload from a file path, streaming its content.
    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        file_path: &str,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<(), StorageError>;

    /// Download object to bytes.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Download object to a file path, truncating anything already there.
    async fn get_object_to_file(
        &self,
        bucket: &str,
        key: &str,
        file_path: &str,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<(), StorageError>;

    /// List objects with prefix.
    async fn list_objects(&self, bucket: &str, prefix: &str)
        -> Result<Vec<ObjectInfo>, StorageError>;
}
