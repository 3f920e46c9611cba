//! Manifest schema version.

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Supported manifest format versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[allow(non_camel_case_types)]
pub enum ManifestVersion {
    #[default]
    #[serde(rename = "2023-03-03")]
    V2023_03_03,
}

impl ManifestVersion {
    /// Get the string representation of the version.
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestVersion::V2023_03_03 => "2023-03-03",
        }
    }

    /// Parse a `manifestVersion` value.
    ///
    /// # Errors
    /// Returns `ManifestError::UnknownVersion` for versions this crate cannot read.
    pub fn parse(version: &str) -> Result<Self, ManifestError> {
        match version {
            "2023-03-03" => Ok(ManifestVersion::V2023_03_03),
            other => Err(ManifestError::UnknownVersion(other.to_string())),
        }
    }
}

impl std::fmt::Display for ManifestVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
