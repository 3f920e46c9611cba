//! Sync configuration.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use asset_sync_model::HashAlgorithm;
use asset_sync_storage::RetrySettings;

/// Options shared by input and output sync.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Concurrent hashing and transfer tasks; available parallelism when unset.
    pub max_concurrency: Option<usize>,
    /// Retry policy for every store request.
    pub retry: RetrySettings,
    /// Algorithm for output manifests when no baseline manifest is given.
    pub hash_algorithm: HashAlgorithm,
}

impl SyncOptions {
    /// Set a fixed concurrency limit.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// Set the output manifest hash algorithm.
    pub fn with_hash_algorithm(mut self, hash_algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = hash_algorithm;
        self
    }

    /// Effective concurrency limit, at least one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(4)
            })
            .max(1)
    }
}
