//! Manifest merging.
//!
//! A task's input root may be fed by the queue-provided manifest plus the
//! outputs of one or more dependency steps writing to the same root. Merging
//! combines entries by relative path: overlays are applied in order and the
//! later overlay wins, so the most recent producer of a path is the one the
//! task sees. Paths absent from every overlay keep the base entry.
//!
//! The merged manifest is a fresh canonical value. It drives the current
//! task's sync only and is never uploaded.

use std::collections::HashMap;

use crate::error::ManifestError;
use crate::manifest::{Manifest, PathEntry};

/// Merge overlays onto a base manifest.
///
/// # Arguments
/// * `base` - The manifest the overlays are applied to (e.g. the queue input manifest)
/// * `overlays` - `(manifest, origin_label)` pairs; later entries win on path conflicts
///
/// # Returns
/// A new canonical manifest with the base's hash algorithm.
///
/// # Errors
/// Returns `ManifestError::MergeHashAlgorithmMismatch` if an overlay was
/// hashed with a different algorithm than the base.
pub fn merge_manifests(
    base: &Manifest,
    overlays: &[(Manifest, String)],
) -> Result<Manifest, ManifestError> {
    for (overlay, origin) in overlays {
        if overlay.hash_alg() != base.hash_alg() {
            return Err(ManifestError::MergeHashAlgorithmMismatch {
                expected: base.hash_alg(),
                actual: overlay.hash_alg(),
                origin: origin.clone(),
            });
        }
    }

    let mut merged_paths: HashMap<&str, &PathEntry> = HashMap::new();
    for entry in base.paths() {
        merged_paths.insert(entry.path.as_str(), entry);
    }
    for (overlay, _) in overlays {
        for entry in overlay.paths() {
            merged_paths.insert(entry.path.as_str(), entry);
        }
    }

    let paths: Vec<PathEntry> = merged_paths.into_values().cloned().collect();
    Ok(Manifest::with_algorithm(base.hash_alg(), paths))
}

/// Merge a non-empty list of overlays with no base manifest.
///
/// # Returns
/// `None` if `overlays` is empty.
///
/// # Errors
/// Same as [`merge_manifests`].
pub fn merge_overlays(overlays: &[(Manifest, String)]) -> Result<Option<Manifest>, ManifestError> {
    match overlays.split_first() {
        None => Ok(None),
        Some(((first, _), rest)) => merge_manifests(first, rest).map(Some),
    }
}
