//! Retrying transfer layer over a [`StorageClient`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;

use crate::error::{StorageError, TransferError};
use crate::retry::{with_retry, RetrySettings};
use crate::traits::{ObjectInfo, ObjectMetadata, ProgressCallback, StorageClient};
use crate::types::{DataSource, StoreSettings, TransferProgress, UploadOutcome};

/// An object read together with its user metadata.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    /// Object content.
    pub data: Vec<u8>,
    /// User-defined metadata.
    pub metadata: HashMap<String, String>,
}

/// Applies the retry policy, progress and cancellation to every request made
/// against one bucket.
pub struct TransferManager<'a, C: StorageClient + ?Sized> {
    client: &'a C,
    settings: StoreSettings,
    retry: RetrySettings,
}

impl<'a, C: StorageClient + ?Sized> TransferManager<'a, C> {
    /// Create a transfer manager with the default retry policy.
    pub fn new(client: &'a C, settings: StoreSettings) -> Self {
        Self::with_retry_settings(client, settings, RetrySettings::default())
    }

    /// Create a transfer manager with explicit retry settings.
    pub fn with_retry_settings(client: &'a C, settings: StoreSettings, retry: RetrySettings) -> Self {
        Self {
            client,
            settings,
            retry,
        }
    }

    /// Store settings this manager targets.
    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Retry policy in use.
    pub fn retry_settings(&self) -> &RetrySettings {
        &self.retry
    }

    fn bucket(&self) -> &str {
        &self.settings.s3_bucket_name
    }

    /// Check whether an object exists.
    ///
    /// # Errors
    /// Returns `TransferError` when the existence check itself fails.
    pub async fn exists(&self, key: &str) -> Result<bool, TransferError> {
        let (client, bucket): (&C, &str) = (self.client, self.bucket());
        let size: Option<u64> =
            with_retry(&self.retry, key, || client.head_object(bucket, key)).await?;
        Ok(size.is_some())
    }

    /// Upload content unless an object already exists under `key`.
    ///
    /// Content keys are immutable, so an existing object is never replaced.
    ///
    /// # Arguments
    /// * `key` - Destination key
    /// * `source` - Bytes or a local file
    /// * `progress` - Optional callback; returning false cancels
    ///
    /// # Errors
    /// - `TransferError::Cancelled` if the callback cancelled the upload
    /// - `TransferError::Fatal` / `TransferError::Exhausted` per the retry policy
    pub async fn upload(
        &self,
        key: &str,
        source: &DataSource,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<UploadOutcome, TransferError> {
        if self.exists(key).await? {
            debug!("Object {} already present, skipping upload", key);
            return Ok(UploadOutcome::Skipped);
        }

        let (client, bucket): (&C, &str) = (self.client, self.bucket());
        match source {
            DataSource::Bytes(data) => {
                let total_bytes: u64 = data.len() as u64;
                report(progress, key, 0, total_bytes)?;
                with_retry(&self.retry, key, || {
                    client.put_object(bucket, key, data, None, None)
                })
                .await?;
                report(progress, key, total_bytes, total_bytes)?;
            }
            DataSource::File(path) => {
                let path_str: String = path.display().to_string();
                with_retry(&self.retry, key, || {
                    client.put_object_from_file(bucket, key, &path_str, progress)
                })
                .await?;
            }
        }

        Ok(UploadOutcome::Uploaded)
    }

    /// Unconditionally write bytes with a content type and user metadata.
    ///
    /// # Errors
    /// `TransferError::Fatal` / `TransferError::Exhausted` per the retry policy.
    pub async fn put_bytes(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
        metadata: &HashMap<String, String>,
    ) -> Result<(), TransferError> {
        let (client, bucket): (&C, &str) = (self.client, self.bucket());
        with_retry(&self.retry, key, || {
            client.put_object(bucket, key, data, content_type, Some(metadata))
        })
        .await
    }

    /// Download an object to `destination`.
    ///
    /// Content is written to a temporary file beside the destination and
    /// renamed into place once complete. On any failure the temporary file
    /// is removed and `destination` is untouched.
    ///
    /// # Errors
    /// - `TransferError::Io` if the destination directory cannot be prepared
    /// - `TransferError::Cancelled` if the callback cancelled the download
    /// - `TransferError::Fatal` / `TransferError::Exhausted` per the retry policy
    pub async fn download(
        &self,
        key: &str,
        destination: &Path,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<(), TransferError> {
        let parent: PathBuf = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| TransferError::io(parent.display().to_string(), e))?;

        let temp_path: TempPath = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(".part")
            .tempfile_in(&parent)
            .map_err(|e| TransferError::io(parent.display().to_string(), e))?
            .into_temp_path();
        let temp_str: String = temp_path.display().to_string();

        let (client, bucket): (&C, &str) = (self.client, self.bucket());
        with_retry(&self.retry, key, || {
            client.get_object_to_file(bucket, key, &temp_str, progress)
        })
        .await?;

        temp_path
            .persist(destination)
            .map_err(|e| TransferError::io(destination.display().to_string(), e.error))?;
        Ok(())
    }

    /// Read a whole object into memory.
    ///
    /// # Errors
    /// `TransferError::Fatal` (including not-found) / `TransferError::Exhausted`.
    pub async fn fetch(&self, key: &str) -> Result<Vec<u8>, TransferError> {
        let (client, bucket): (&C, &str) = (self.client, self.bucket());
        with_retry(&self.retry, key, || client.get_object(bucket, key)).await
    }

    /// Read a whole object and its user metadata.
    ///
    /// # Errors
    /// `TransferError::Fatal` (including not-found) / `TransferError::Exhausted`.
    pub async fn fetch_with_metadata(&self, key: &str) -> Result<FetchedObject, TransferError> {
        let (client, bucket): (&C, &str) = (self.client, self.bucket());
        let head: Option<ObjectMetadata> = with_retry(&self.retry, key, || {
            client.head_object_with_metadata(bucket, key)
        })
        .await?;
        let head: ObjectMetadata = head.ok_or_else(|| TransferError::Fatal {
            key: key.to_string(),
            source: StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
        })?;
        let data: Vec<u8> = self.fetch(key).await?;
        Ok(FetchedObject {
            data,
            metadata: head.user_metadata,
        })
    }

    /// List every object under a prefix.
    ///
    /// # Errors
    /// `TransferError::Fatal` / `TransferError::Exhausted` per the retry policy.
    pub async fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, TransferError> {
        let (client, bucket): (&C, &str) = (self.client, self.bucket());
        with_retry(&self.retry, prefix, || client.list_objects(bucket, prefix))
        .await
    }
}

fn report(
    progress: Option<&dyn ProgressCallback>,
    key: &str,
    bytes_transferred: u64,
    total_bytes: u64,
) -> Result<(), TransferError> {
    let Some(callback) = progress else {
        return Ok(());
    };
    let update: TransferProgress = TransferProgress {
        key: key.to_string(),
        bytes_transferred,
        total_bytes,
    };
    if callback.on_progress(&update) {
        Ok(())
    } else {
        Err(TransferError::Cancelled {
            key: key.to_string(),
        })
    }
}
