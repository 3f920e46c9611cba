//! Job and queue metadata lookups.

use async_trait::async_trait;
use tracing::debug;

use asset_sync_storage::StoreSettings;

use crate::error::MetadataError;
use crate::types::{Attachments, Job, Queue};

/// Read-only access to the job and queue services.
#[async_trait]
pub trait JobMetadataService: Send + Sync {
    /// Fetch a job. Returns None if it does not exist.
    async fn get_job(
        &self,
        farm_id: &str,
        queue_id: &str,
        job_id: &str,
    ) -> Result<Option<Job>, MetadataError>;

    /// Fetch a queue. Returns None if it does not exist.
    async fn get_queue(&self, farm_id: &str, queue_id: &str)
        -> Result<Option<Queue>, MetadataError>;
}

/// Attachments of a job.
///
/// # Returns
/// None when the job does not exist or has no attachments; callers treat
/// this as nothing to synchronize.
///
/// # Errors
/// Returns `MetadataError` if the service call fails.
pub async fn get_attachments(
    service: &dyn JobMetadataService,
    farm_id: &str,
    queue_id: &str,
    job_id: &str,
) -> Result<Option<Attachments>, MetadataError> {
    let job: Option<Job> = service.get_job(farm_id, queue_id, job_id).await?;
    if job.is_none() {
        debug!("Job {} not found in {}/{}", job_id, farm_id, queue_id);
    }
    Ok(job.and_then(|j| j.attachments))
}

/// Job attachment store settings of a queue.
///
/// # Returns
/// None when the queue does not exist or has no job attachment settings.
///
/// # Errors
/// Returns `MetadataError` if the service call fails.
pub async fn get_s3_settings(
    service: &dyn JobMetadataService,
    farm_id: &str,
    queue_id: &str,
) -> Result<Option<StoreSettings>, MetadataError> {
    let queue: Option<Queue> = service.get_queue(farm_id, queue_id).await?;
    if queue.is_none() {
        debug!("Queue {} not found in {}", queue_id, farm_id);
    }
    Ok(queue.and_then(|q| q.job_attachment_settings))
}
