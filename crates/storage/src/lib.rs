//! Object store access for job attachments.
//!
//! - [`StorageClient`] - the backend contract (HEAD/PUT/GET/LIST)
//! - [`TransferManager`] - retry with jittered backoff, progress,
//!   cancellation, skip-if-present uploads and atomic downloads
//! - [`keys`] - content and manifest key layout
//! - [`discovery`] - finding the latest output manifests of a step

pub mod discovery;
mod error;
pub mod keys;
pub mod retry;
mod traits;
mod transfer;
mod types;

pub use discovery::{
    discover_step_output_manifests, parse_output_manifest_key, select_latest_per_task,
    OutputManifestKey,
};
pub use error::{StorageError, TransferError};
pub use keys::{
    data_key, iso_timestamp, manifest_key, step_output_prefix, ManifestObjectMetadata,
    OutputManifestPath, MANIFEST_CONTENT_TYPE,
};
pub use retry::{with_retry, RetrySettings, DEFAULT_MAX_ATTEMPTS};
pub use traits::{ObjectInfo, ObjectMetadata, ProgressCallback, StorageClient};
pub use transfer::{FetchedObject, TransferManager};
pub use types::{
    DataSource, StoreSettings, TransferProgress, UploadOutcome, DATA_PREFIX, MANIFEST_PREFIX,
};
