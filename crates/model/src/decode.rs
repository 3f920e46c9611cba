//! Manifest decoding with version and algorithm checks.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ManifestError, ValidationError};
use crate::hash::HashAlgorithm;
use crate::manifest::{Manifest, PathEntry};
use crate::version::ManifestVersion;

/// Wire shape of a manifest before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    paths: Vec<PathEntry>,
    total_size: u64,
}

/// Decode a manifest from a JSON string.
///
/// # Errors
/// - `ManifestError::JsonParse` for malformed JSON or missing fields
/// - `ManifestError::UnknownVersion` for a missing or unsupported `manifestVersion`
/// - `ManifestError::UnsupportedHashAlgorithm` for an unknown `hashAlg`
/// - `ManifestError::Validation` for unsafe paths or an inconsistent `totalSize`
pub fn decode_manifest(json: &str) -> Result<Manifest, ManifestError> {
    decode_value(serde_json::from_str(json)?)
}

/// Decode a manifest from raw bytes as fetched from the store.
///
/// # Errors
/// Same as [`decode_manifest`]; invalid UTF-8 is reported as a JSON error.
pub fn decode_manifest_bytes(bytes: &[u8]) -> Result<Manifest, ManifestError> {
    decode_value(serde_json::from_slice(bytes)?)
}

fn decode_value(data: Value) -> Result<Manifest, ManifestError> {
    let version_str: &str = data
        .get("manifestVersion")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ManifestError::UnknownVersion("missing manifestVersion".to_string()))?;
    ManifestVersion::parse(version_str)?;

    let alg_str: &str = data
        .get("hashAlg")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ManifestError::UnsupportedHashAlgorithm("missing hashAlg".to_string()))?;
    let hash_alg: HashAlgorithm = HashAlgorithm::parse(alg_str)?;

    let raw: RawManifest = serde_json::from_value(data)?;
    let actual_size: u64 = raw.paths.iter().map(|p| p.size).sum();
    if actual_size != raw.total_size {
        return Err(ValidationError::TotalSizeMismatch {
            declared: raw.total_size,
            actual: actual_size,
        }
        .into());
    }

    let manifest: Manifest = Manifest::with_algorithm(hash_alg, raw.paths);
    manifest.validate()?;
    Ok(manifest)
}
