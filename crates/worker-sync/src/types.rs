//! Job attachment types shared with the job and queue services.

use serde::{Deserialize, Serialize};

use asset_sync_storage::StoreSettings;

/// Operating system path format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathFormat {
    Windows,
    Posix,
}

impl PathFormat {
    /// Get the path format for the current host.
    pub fn host() -> Self {
        #[cfg(windows)]
        {
            PathFormat::Windows
        }
        #[cfg(not(windows))]
        {
            PathFormat::Posix
        }
    }

    /// Lower-case name, as recorded in manifest metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            PathFormat::Windows => "windows",
            PathFormat::Posix => "posix",
        }
    }

    /// Parse a recorded format name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "windows" => Some(PathFormat::Windows),
            "posix" => Some(PathFormat::Posix),
            _ => None,
        }
    }
}

/// How input files are made available to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileSystemMode {
    /// Files are downloaded into the session directory.
    #[default]
    Copied,
    /// Files are served lazily from a virtual file system mount.
    Virtual,
}

/// Properties of one asset root referenced by a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestProperties {
    /// Root path the manifest was created from.
    pub root_path: String,
    /// Path format of the root path.
    pub root_path_format: PathFormat,
    /// File system location name (from storage profile).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_system_location_name: Option<String>,
    /// Key of the input manifest, relative to the manifest prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_manifest_path: Option<String>,
    /// Content address of the input manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_manifest_hash: Option<String>,
    /// Relative paths of output directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_relative_directories: Option<Vec<String>>,
}

impl ManifestProperties {
    /// Properties for a root with no input manifest and no outputs.
    pub fn new(root_path: impl Into<String>, root_path_format: PathFormat) -> Self {
        Self {
            root_path: root_path.into(),
            root_path_format,
            file_system_location_name: None,
            input_manifest_path: None,
            input_manifest_hash: None,
            output_relative_directories: None,
        }
    }
}

/// Job attachments payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachments {
    /// One entry per asset root.
    pub manifests: Vec<ManifestProperties>,
    /// Requested file system mode.
    #[serde(default)]
    pub file_system: FileSystemMode,
}

/// Maps a submitted root onto the local directory it was materialized in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathMappingRule {
    pub source_path_format: PathFormat,
    pub source_path: String,
    pub destination_path: String,
}

/// Job record as returned by the job service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Attachments>,
}

/// Queue record as returned by the queue service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub queue_id: String,
    pub display_name: String,
    pub farm_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_attachment_settings: Option<StoreSettings>,
}
