//! Worker-side job attachment synchronization.
//!
//! Composes the manifest model, file system and storage crates into the two
//! operations a worker runs around every task:
//!
//! - **Input sync** - [`AssetSync::sync_inputs`] resolves each asset root to
//!   a local directory, merges the latest outputs of dependency steps into
//!   the job's input manifests, then mounts or downloads the result
//! - **Output sync** - [`AssetSync::sync_outputs`] hashes the task's output
//!   directories, uploads content the store does not have yet and publishes
//!   one output manifest per root
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use asset_sync_worker::{AssetSync, InputSyncRequest};
//!
//! async fn prepare<C: StorageClient>(client: Arc<C>, settings: &StoreSettings, attachments: &Attachments) {
//!     let sync = AssetSync::new("farm-123", client);
//!     let request = InputSyncRequest::new(settings, attachments, "queue-456", "job-789", session_dir);
//!     let (stats, rules) = sync.sync_inputs(&request, None).await?;
//! }
//! ```

mod asset_sync;
mod error;
mod metadata;
mod mount;
mod options;
mod paths;
mod progress;
mod telemetry;
mod types;

pub use asset_sync::{AssetSync, InputSyncRequest, OutputSyncRequest};
pub use error::{MetadataError, SyncError};
pub use metadata::{get_attachments, get_s3_settings, JobMetadataService};
pub use mount::{
    host_supports_virtual_fs, ExecutableMountHelper, MountError, MountHandle, MountHelper,
    MountRequest, NoMountHelper, VFS_EXECUTABLE, VFS_PATH_ENV,
};
pub use options::SyncOptions;
pub use paths::{build_rule, destination_dir_name, DestinationResolver, ResolvedRoot};
pub use progress::{
    human_readable_file_size, FileProgress, ProgressReport, ProgressReporter, ProgressStatus,
    ProgressTracker, SummaryStatistics,
};
pub use telemetry::{SummarySink, SyncDirection, TracingSummarySink};
pub use types::{
    Attachments, FileSystemMode, Job, ManifestProperties, PathFormat, PathMappingRule, Queue,
};
