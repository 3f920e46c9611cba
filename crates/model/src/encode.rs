//! Canonical JSON encoding for manifests.

use serde_json::{json, Value};

use crate::error::ManifestError;
use crate::manifest::{canonical_order, Manifest, PathEntry};

/// Encode a manifest to canonical JSON.
///
/// Output is compact, object keys are sorted, and entries are ordered by
/// content hash then path, so equal entry sets always produce equal bytes.
///
/// # Arguments
/// * `manifest` - The manifest to encode.
///
/// # Returns
/// Canonical JSON string.
pub fn encode_manifest(manifest: &Manifest) -> Result<String, ManifestError> {
    let mut sorted: Vec<&PathEntry> = manifest.paths().iter().collect();
    sorted.sort_by(|a, b| canonical_order(a, b));

    let paths_json: Vec<Value> = sorted
        .iter()
        .map(|p| {
            json!({
                "hash": p.hash,
                "mtime": p.mtime,
                "path": p.path,
                "size": p.size,
            })
        })
        .collect();

    // serde_json's default map is ordered, which keeps keys sorted.
    let output: Value = json!({
        "hashAlg": manifest.hash_alg(),
        "manifestVersion": manifest.version(),
        "paths": paths_json,
        "totalSize": manifest.total_size(),
    });

    Ok(serde_json::to_string(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_canonical_json() {
        let manifest: Manifest = Manifest::new(vec![
            PathEntry::new("b.txt", "hash2", 200, 2000),
            PathEntry::new("a.txt", "hash1", 100, 1000),
        ]);
        let encoded: String = encode_manifest(&manifest).unwrap();

        assert_eq!(
            encoded,
            r#"{"hashAlg":"xxh128","manifestVersion":"2023-03-03","paths":[{"hash":"hash1","mtime":1000,"path":"a.txt","size":100},{"hash":"hash2","mtime":2000,"path":"b.txt","size":200}],"totalSize":300}"#
        );
    }

    #[test]
    fn test_entries_ordered_by_hash_not_path() {
        let manifest: Manifest = Manifest::new(vec![
            PathEntry::new("a.txt", "ffff", 1, 1),
            PathEntry::new("z.txt", "0000", 1, 1),
        ]);
        let encoded: String = encode_manifest(&manifest).unwrap();

        let z_pos: usize = encoded.find("z.txt").unwrap();
        let a_pos: usize = encoded.find("a.txt").unwrap();
        assert!(z_pos < a_pos);
    }

    #[test]
    fn test_encode_empty_manifest() {
        let manifest: Manifest = Manifest::new(vec![]);
        assert_eq!(
            encode_manifest(&manifest).unwrap(),
            r#"{"hashAlg":"xxh128","manifestVersion":"2023-03-03","paths":[],"totalSize":0}"#
        );
    }

    #[test]
    fn test_different_insertion_order_same_bytes() {
        let entries: Vec<PathEntry> = vec![
            PathEntry::new("renders/b.exr", "cc", 3, 30),
            PathEntry::new("renders/a.exr", "aa", 1, 10),
            PathEntry::new("scene.blend", "bb", 2, 20),
        ];
        let mut reversed: Vec<PathEntry> = entries.clone();
        reversed.reverse();

        let first: String = encode_manifest(&Manifest::new(entries)).unwrap();
        let second: String = encode_manifest(&Manifest::new(reversed)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_content_address_is_hash_of_encoding() {
        let manifest: Manifest = Manifest::new(vec![PathEntry::new("a.txt", "hash1", 1, 1)]);
        let encoded: String = encode_manifest(&manifest).unwrap();

        assert_eq!(
            manifest.content_address().unwrap(),
            manifest.hash_alg().hash_bytes(encoded.as_bytes())
        );
    }
}
