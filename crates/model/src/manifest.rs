//! Manifest and entry types (v2023-03-03 format).
//!
//! A manifest describes one asset root: every file's relative path, content
//! hash, size and modification time. Entries are kept in canonical order
//! (content hash, then path) from construction onwards, so two manifests
//! with the same entry set compare equal and encode to identical bytes.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, ValidationError};
use crate::hash::HashAlgorithm;
use crate::version::ManifestVersion;

/// File entry in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathEntry {
    /// Relative file path within the root, `/`-separated.
    pub path: String,
    /// Content hash, hex encoded.
    pub hash: String,
    /// File size in bytes.
    pub size: u64,
    /// Modification time in microseconds since epoch.
    pub mtime: i64,
}

impl PathEntry {
    /// Create a new manifest entry.
    pub fn new(path: impl Into<String>, hash: impl Into<String>, size: u64, mtime: i64) -> Self {
        Self {
            path: path.into(),
            hash: hash.into(),
            size,
            mtime,
        }
    }
}

/// Asset manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    hash_alg: HashAlgorithm,
    manifest_version: ManifestVersion,
    paths: Vec<PathEntry>,
    total_size: u64,
}

impl Manifest {
    /// Create a manifest hashed with the default algorithm.
    pub fn new(paths: Vec<PathEntry>) -> Self {
        Self::with_algorithm(HashAlgorithm::default(), paths)
    }

    /// Create a manifest whose entries were hashed with `hash_alg`.
    ///
    /// Entries are sorted into canonical order and `totalSize` is derived.
    pub fn with_algorithm(hash_alg: HashAlgorithm, mut paths: Vec<PathEntry>) -> Self {
        paths.sort_by(canonical_order);
        let total_size: u64 = paths.iter().map(|p| p.size).sum();
        Self {
            hash_alg,
            manifest_version: ManifestVersion::V2023_03_03,
            paths,
            total_size,
        }
    }

    /// Create a manifest with no entries.
    pub fn empty(hash_alg: HashAlgorithm) -> Self {
        Self::with_algorithm(hash_alg, Vec::new())
    }

    /// Decode a manifest from JSON.
    pub fn decode(json: &str) -> Result<Self, ManifestError> {
        crate::decode::decode_manifest(json)
    }

    /// Encode the manifest to canonical JSON.
    pub fn encode(&self) -> Result<String, ManifestError> {
        crate::encode::encode_manifest(self)
    }

    /// Hash of the canonical encoding; the key under which this manifest is stored.
    pub fn content_address(&self) -> Result<String, ManifestError> {
        let encoded: String = self.encode()?;
        Ok(self.hash_alg.hash_bytes(encoded.as_bytes()))
    }

    /// Get the hash algorithm used for every entry.
    pub fn hash_alg(&self) -> HashAlgorithm {
        self.hash_alg
    }

    /// Get the manifest format version.
    pub fn version(&self) -> ManifestVersion {
        self.manifest_version
    }

    /// Entries in canonical order.
    pub fn paths(&self) -> &[PathEntry] {
        &self.paths
    }

    /// Consume the manifest, returning its entries.
    pub fn into_paths(self) -> Vec<PathEntry> {
        self.paths
    }

    /// Get the total size of all files.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Get the number of file entries.
    pub fn file_count(&self) -> usize {
        self.paths.len()
    }

    /// Check whether the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Look up an entry by relative path.
    pub fn get(&self, path: &str) -> Option<&PathEntry> {
        self.paths.iter().find(|p| p.path == path)
    }

    /// Check entry paths and sizes.
    ///
    /// # Errors
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.paths.len());
        for entry in &self.paths {
            validate_relative_path(&entry.path)?;
            if entry.hash.is_empty() {
                return Err(ValidationError::EmptyHash {
                    path: entry.path.clone(),
                });
            }
            if !seen.insert(entry.path.as_str()) {
                return Err(ValidationError::DuplicatePath {
                    path: entry.path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Canonical entry order: content hash, then path by UTF-16 code units.
pub fn canonical_order(a: &PathEntry, b: &PathEntry) -> Ordering {
    a.hash.cmp(&b.hash).then_with(|| {
        let a_units = a.path.encode_utf16();
        let b_units = b.path.encode_utf16();
        a_units.cmp(b_units)
    })
}

/// Check that a manifest path is relative and stays inside its root.
///
/// Names containing `\` or `:` are legal POSIX file names and pass; they are
/// refused when joined onto a Windows root.
///
/// # Errors
/// Returns a `ValidationError` describing why the path is unsafe.
pub fn validate_relative_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    if path.starts_with('/') {
        return Err(ValidationError::AbsolutePath {
            path: path.to_string(),
        });
    }
    if path.split('/').any(|component| component == "..") {
        return Err(ValidationError::EscapingPath {
            path: path.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_entry_new() {
        let entry: PathEntry = PathEntry::new("test/file.txt", "abc123", 1024, 1234567890);
        assert_eq!(entry.path, "test/file.txt");
        assert_eq!(entry.hash, "abc123");
        assert_eq!(entry.size, 1024);
        assert_eq!(entry.mtime, 1234567890);
    }

    #[test]
    fn test_manifest_new() {
        let manifest: Manifest = Manifest::new(vec![
            PathEntry::new("a.txt", "hash1", 100, 1000),
            PathEntry::new("b.txt", "hash2", 200, 2000),
        ]);

        assert_eq!(manifest.hash_alg(), HashAlgorithm::Xxh128);
        assert_eq!(manifest.version(), ManifestVersion::V2023_03_03);
        assert_eq!(manifest.total_size(), 300);
        assert_eq!(manifest.file_count(), 2);
    }

    #[test]
    fn test_entries_sorted_by_hash_then_path() {
        let manifest: Manifest = Manifest::new(vec![
            PathEntry::new("z.txt", "bbb", 1, 1),
            PathEntry::new("b.txt", "aaa", 1, 1),
            PathEntry::new("a.txt", "aaa", 1, 1),
        ]);

        let order: Vec<&str> = manifest.paths().iter().map(|p| p.path.as_str()).collect();
        assert_eq!(order, vec!["a.txt", "b.txt", "z.txt"]);
    }

    #[test]
    fn test_insertion_order_does_not_affect_equality() {
        let a: Manifest = Manifest::new(vec![
            PathEntry::new("a.txt", "hash1", 1, 1),
            PathEntry::new("b.txt", "hash2", 2, 2),
        ]);
        let b: Manifest = Manifest::new(vec![
            PathEntry::new("b.txt", "hash2", 2, 2),
            PathEntry::new("a.txt", "hash1", 1, 1),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_get_entry() {
        let manifest: Manifest = Manifest::new(vec![PathEntry::new("dir/a.txt", "h", 3, 4)]);
        assert_eq!(manifest.get("dir/a.txt").map(|e| e.size), Some(3));
        assert!(manifest.get("missing").is_none());
    }

    #[test]
    fn test_validate_relative_path() {
        assert!(validate_relative_path("renders/frame_001.exr").is_ok());
        assert!(matches!(
            validate_relative_path("/etc/passwd"),
            Err(ValidationError::AbsolutePath { .. })
        ));
        assert!(matches!(
            validate_relative_path("a/../../b"),
            Err(ValidationError::EscapingPath { .. })
        ));
        assert!(matches!(validate_relative_path(""), Err(ValidationError::EmptyPath)));
    }

    #[test]
    fn test_validate_accepts_posix_only_names() {
        assert!(validate_relative_path("c:notes.txt").is_ok());
        assert!(validate_relative_path("out/a\\b.txt").is_ok());
        assert!(validate_relative_path("renders/..frame.exr").is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let manifest: Manifest = Manifest::new(vec![
            PathEntry::new("a.txt", "hash1", 1, 1),
            PathEntry::new("a.txt", "hash2", 1, 1),
        ]);
        assert!(matches!(
            manifest.validate(),
            Err(ValidationError::DuplicatePath { .. })
        ));
    }
}
