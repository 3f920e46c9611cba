//! Object key layout and manifest object metadata.
//!
//! ```text
//! <rootPrefix>/Data/<contentHash>
//! <rootPrefix>/Manifests/<inputManifestPath>
//! <rootPrefix>/Manifests/<farm>/<queue>/<job>/<step>/<task>/<sessionAction>_<isoTimestamp>/<manifestHash>_output.<hashAlg>
//! ```

use std::collections::HashMap;

use asset_sync_model::HashAlgorithm;
use chrono::{DateTime, Utc};

use crate::types::{join_key, StoreSettings};

/// Metadata key holding the root path a manifest was built from (ASCII roots).
pub const ASSET_ROOT_METADATA_KEY: &str = "asset-root";

/// Metadata key holding a JSON string literal of a non-ASCII root path.
pub const ASSET_ROOT_JSON_METADATA_KEY: &str = "asset-root-json";

/// Metadata key holding the root path format (`posix` or `windows`).
pub const ROOT_PATH_FORMAT_METADATA_KEY: &str = "root-path-format";

/// Metadata key holding the storage-profile location name.
pub const FILE_SYSTEM_LOCATION_METADATA_KEY: &str = "file-system-location-name";

/// Content type of encoded manifests.
pub const MANIFEST_CONTENT_TYPE: &str = "application/x-deadline-manifest-2023-03-03";

/// Format used for the timestamp part of output manifest prefixes.
const ISO_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Key of a content blob.
pub fn data_key(settings: &StoreSettings, hash: &str) -> String {
    join_key(&settings.full_cas_prefix(), hash)
}

/// Full key of a manifest given its path relative to the manifest prefix.
pub fn manifest_key(settings: &StoreSettings, manifest_path: &str) -> String {
    join_key(&settings.full_manifest_prefix(), manifest_path)
}

/// Prefix holding every output manifest of one step.
pub fn step_output_prefix(
    settings: &StoreSettings,
    farm_id: &str,
    queue_id: &str,
    job_id: &str,
    step_id: &str,
) -> String {
    manifest_key(
        settings,
        &format!("{}/{}/{}/{}/", farm_id, queue_id, job_id, step_id),
    )
}

/// Format a timestamp the way output manifest prefixes carry it.
pub fn iso_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(ISO_TIMESTAMP_FORMAT).to_string()
}

/// Identity of one task run's output manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputManifestPath {
    pub farm_id: String,
    pub queue_id: String,
    pub job_id: String,
    pub step_id: String,
    pub task_id: String,
    pub session_action_id: String,
    /// When the session action started.
    pub timestamp: DateTime<Utc>,
}

impl OutputManifestPath {
    /// Prefix shared by every root's output manifest for this run.
    pub fn prefix(&self, settings: &StoreSettings) -> String {
        let step_prefix: String = step_output_prefix(
            settings,
            &self.farm_id,
            &self.queue_id,
            &self.job_id,
            &self.step_id,
        );
        format!(
            "{}{}/{}_{}",
            step_prefix,
            self.task_id,
            self.session_action_id,
            iso_timestamp(&self.timestamp)
        )
    }

    /// Key of the output manifest with the given content address.
    pub fn key(&self, settings: &StoreSettings, manifest_hash: &str, alg: HashAlgorithm) -> String {
        format!(
            "{}/{}_output.{}",
            self.prefix(settings),
            manifest_hash,
            alg.extension()
        )
    }
}

/// Object metadata attached to uploaded manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestObjectMetadata {
    /// Root path the manifest was built from, as submitted.
    pub asset_root: String,
    /// `posix` or `windows`.
    pub root_path_format: Option<String>,
    /// Storage-profile location name, when the root has one.
    pub file_system_location_name: Option<String>,
}

impl ManifestObjectMetadata {
    /// Render as user metadata.
    ///
    /// Object metadata must be ASCII, so non-ASCII roots are stored as an
    /// escaped JSON string under `asset-root-json`.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = HashMap::new();
        if self.asset_root.is_ascii() {
            map.insert(ASSET_ROOT_METADATA_KEY.to_string(), self.asset_root.clone());
        } else {
            map.insert(
                ASSET_ROOT_JSON_METADATA_KEY.to_string(),
                ascii_json_string(&self.asset_root),
            );
        }
        if let Some(format) = &self.root_path_format {
            map.insert(ROOT_PATH_FORMAT_METADATA_KEY.to_string(), format.clone());
        }
        if let Some(name) = &self.file_system_location_name {
            map.insert(FILE_SYSTEM_LOCATION_METADATA_KEY.to_string(), name.clone());
        }
        map
    }

    /// Read from user metadata.
    ///
    /// # Returns
    /// None if no asset root is recorded.
    pub fn from_map(map: &HashMap<String, String>) -> Option<Self> {
        let asset_root: String = match map.get(ASSET_ROOT_METADATA_KEY) {
            Some(root) => root.clone(),
            None => {
                let encoded: &String = map.get(ASSET_ROOT_JSON_METADATA_KEY)?;
                serde_json::from_str::<String>(encoded).ok()?
            }
        };
        Some(Self {
            asset_root,
            root_path_format: map.get(ROOT_PATH_FORMAT_METADATA_KEY).cloned(),
            file_system_location_name: map.get(FILE_SYSTEM_LOCATION_METADATA_KEY).cloned(),
        })
    }
}

/// JSON string literal with every non-ASCII character escaped as `\uXXXX`.
fn ascii_json_string(value: &str) -> String {
    let quoted: String = serde_json::Value::String(value.to_string()).to_string();
    let mut escaped: String = String::with_capacity(quoted.len());
    for c in quoted.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units: [u16; 2] = [0; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> StoreSettings {
        StoreSettings::new("bucket", "assetRoot")
    }

    #[test]
    fn test_data_key() {
        assert_eq!(data_key(&settings(), "hash1"), "assetRoot/Data/hash1");
    }

    #[test]
    fn test_manifest_key() {
        assert_eq!(
            manifest_key(&settings(), "farm-1/queue-1/Inputs/abc/xyz_input"),
            "assetRoot/Manifests/farm-1/queue-1/Inputs/abc/xyz_input"
        );
    }

    #[test]
    fn test_output_manifest_key() {
        let path: OutputManifestPath = OutputManifestPath {
            farm_id: "farm-1".into(),
            queue_id: "queue-1".into(),
            job_id: "job-1".into(),
            step_id: "step-1".into(),
            task_id: "task-1".into(),
            session_action_id: "sessionaction-1-0".into(),
            timestamp: DateTime::from_timestamp_micros(1_716_414_026_409_012).unwrap(),
        };
        assert_eq!(
            path.key(&settings(), "0123abcd", HashAlgorithm::Xxh128),
            "assetRoot/Manifests/farm-1/queue-1/job-1/step-1/task-1/\
             sessionaction-1-0_2024-05-22T21:40:26.409012Z/0123abcd_output.xxh128"
        );
    }

    #[test]
    fn test_metadata_ascii_root() {
        let metadata: ManifestObjectMetadata = ManifestObjectMetadata {
            asset_root: "/tmp/root".into(),
            root_path_format: Some("posix".into()),
            file_system_location_name: None,
        };
        let map: HashMap<String, String> = metadata.to_map();
        assert_eq!(map.get("asset-root").map(String::as_str), Some("/tmp/root"));
        assert!(!map.contains_key("file-system-location-name"));
        assert_eq!(ManifestObjectMetadata::from_map(&map), Some(metadata));
    }

    #[test]
    fn test_metadata_non_ascii_root() {
        let metadata: ManifestObjectMetadata = ManifestObjectMetadata {
            asset_root: "/tmp/ルート".into(),
            root_path_format: Some("posix".into()),
            file_system_location_name: Some("Shared".into()),
        };
        let map: HashMap<String, String> = metadata.to_map();
        assert!(!map.contains_key("asset-root"));
        let encoded: &String = map.get("asset-root-json").unwrap();
        assert!(encoded.is_ascii());
        assert_eq!(encoded, "\"/tmp/\\u30eb\\u30fc\\u30c8\"");
        assert_eq!(ManifestObjectMetadata::from_map(&map), Some(metadata));
    }

    #[test]
    fn test_metadata_missing_root() {
        assert!(ManifestObjectMetadata::from_map(&HashMap::new()).is_none());
    }
}
