//! Error types for manifest operations.

use thiserror::Error;

use crate::hash::HashAlgorithm;

/// Errors that can occur during manifest operations.
///
/// Every variant is fatal: a manifest that fails to decode is never retried.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Unknown manifest version: {0}")]
    UnknownVersion(String),

    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cannot merge manifests with different hash algorithms: expected {expected:?}, got {actual:?} (from {origin})")]
    MergeHashAlgorithmMismatch {
        expected: HashAlgorithm,
        actual: HashAlgorithm,
        origin: String,
    },
}

/// Validation errors for manifest entries.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Entry path must not be empty")]
    EmptyPath,

    #[error("Entry path '{path}' must be relative")]
    AbsolutePath { path: String },

    #[error("Entry path '{path}' escapes the manifest root")]
    EscapingPath { path: String },

    #[error("Entry '{path}' has an empty hash")]
    EmptyHash { path: String },

    #[error("Duplicate entry '{path}'")]
    DuplicatePath { path: String },

    #[error("totalSize {declared} does not match the sum of entry sizes {actual}")]
    TotalSizeMismatch { declared: u64, actual: u64 },
}
