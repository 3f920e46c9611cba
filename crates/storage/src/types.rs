//! Storage configuration and transfer data types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Prefix under the root prefix holding content blobs.
pub const DATA_PREFIX: &str = "Data";

/// Prefix under the root prefix holding manifests.
pub const MANIFEST_PREFIX: &str = "Manifests";

/// Queue-level location of the content-addressed store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    /// Bucket holding job attachments.
    pub s3_bucket_name: String,
    /// Key prefix all attachment objects live under.
    pub root_prefix: String,
}

impl StoreSettings {
    /// Create settings for a bucket and root prefix.
    pub fn new(s3_bucket_name: impl Into<String>, root_prefix: impl Into<String>) -> Self {
        Self {
            s3_bucket_name: s3_bucket_name.into(),
            root_prefix: root_prefix.into(),
        }
    }

    /// Prefix for content blobs, e.g. `DeadlineCloud/Data`.
    pub fn full_cas_prefix(&self) -> String {
        join_key(&self.root_prefix, DATA_PREFIX)
    }

    /// Prefix for manifests, e.g. `DeadlineCloud/Manifests`.
    pub fn full_manifest_prefix(&self) -> String {
        join_key(&self.root_prefix, MANIFEST_PREFIX)
    }
}

/// Join two key segments with a single `/`.
pub(crate) fn join_key(prefix: &str, rest: &str) -> String {
    let prefix: &str = prefix.trim_end_matches('/');
    let rest: &str = rest.trim_start_matches('/');
    if prefix.is_empty() {
        rest.to_string()
    } else {
        format!("{}/{}", prefix, rest)
    }
}

/// Source of an upload.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// In-memory payload.
    Bytes(Vec<u8>),
    /// Local file, streamed by the client.
    File(PathBuf),
}

/// Progress of a single object transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferProgress {
    /// Object key being transferred.
    pub key: String,
    /// Bytes transferred so far.
    pub bytes_transferred: u64,
    /// Total bytes of the object, when known.
    pub total_bytes: u64,
}

impl TransferProgress {
    /// Whether every byte has been transferred.
    pub fn is_complete(&self) -> bool {
        self.bytes_transferred >= self.total_bytes
    }
}

/// Result of [`TransferManager::upload`](crate::TransferManager::upload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The object was written.
    Uploaded,
    /// An object already existed under the key.
    Skipped,
}
