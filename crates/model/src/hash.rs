//! Hash algorithm definitions.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::{xxh3_128, Xxh3};

use crate::error::ManifestError;

/// Supported hashing algorithms for file content.
///
/// The algorithm is a property of each manifest: content is always hashed
/// with the algorithm of the manifest it is being compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HashAlgorithm {
    #[default]
    #[serde(rename = "xxh128")]
    Xxh128,
}

impl HashAlgorithm {
    /// Get the string representation of the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Xxh128 => "xxh128",
        }
    }

    /// Get the file extension used for manifest objects.
    pub fn extension(&self) -> &'static str {
        match self {
            HashAlgorithm::Xxh128 => "xxh128",
        }
    }

    /// Parse an algorithm name as it appears in a manifest.
    ///
    /// # Errors
    /// Returns `ManifestError::UnsupportedHashAlgorithm` for unknown names.
    pub fn parse(name: &str) -> Result<Self, ManifestError> {
        match name {
            "xxh128" => Ok(HashAlgorithm::Xxh128),
            other => Err(ManifestError::UnsupportedHashAlgorithm(other.to_string())),
        }
    }

    /// Hash a small in-memory payload.
    ///
    /// # Returns
    /// Lower-case hex digest.
    pub fn hash_bytes(&self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Xxh128 => format!("{:032x}", xxh3_128(data)),
        }
    }

    /// Create an incremental hasher for streamed content.
    pub fn hasher(&self) -> ContentHasher {
        match self {
            HashAlgorithm::Xxh128 => ContentHasher::Xxh128(Box::new(Xxh3::new())),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Incremental hasher returned by [`HashAlgorithm::hasher`].
pub enum ContentHasher {
    Xxh128(Box<Xxh3>),
}

impl ContentHasher {
    /// Feed a chunk of content.
    pub fn update(&mut self, chunk: &[u8]) {
        match self {
            ContentHasher::Xxh128(h) => h.update(chunk),
        }
    }

    /// Finish hashing and return the lower-case hex digest.
    pub fn finish(self) -> String {
        match self {
            ContentHasher::Xxh128(h) => format!("{:032x}", h.digest128()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_algorithm() {
        assert_eq!(HashAlgorithm::parse("xxh128").unwrap(), HashAlgorithm::Xxh128);
    }

    #[test]
    fn test_parse_unknown_algorithm() {
        let result: Result<HashAlgorithm, ManifestError> = HashAlgorithm::parse("md5");
        assert!(matches!(
            result,
            Err(ManifestError::UnsupportedHashAlgorithm(ref name)) if name == "md5"
        ));
    }

    #[test]
    fn test_hash_bytes_is_32_hex_digits() {
        let digest: String = HashAlgorithm::Xxh128.hash_bytes(b"hello world");
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_streamed_hash_matches_one_shot() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        let mut hasher: ContentHasher = HashAlgorithm::Xxh128.hasher();
        for chunk in data.chunks(777) {
            hasher.update(chunk);
        }

        assert_eq!(hasher.finish(), HashAlgorithm::Xxh128.hash_bytes(&data));
    }

    #[test]
    fn test_display() {
        assert_eq!(HashAlgorithm::Xxh128.to_string(), "xxh128");
    }
}
