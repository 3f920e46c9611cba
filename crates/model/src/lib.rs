//! Job attachments manifest model.
//!
//! This crate provides the v2023-03-03 manifest format used to describe one
//! asset root:
//! - [`Manifest`] / [`PathEntry`] - typed records, kept in canonical order
//! - `encode` / `decode` - canonical JSON codec (`decode(encode(m)) == m`)
//! - [`Manifest::content_address`] - hash of the canonical encoding
//! - [`merge_manifests`] - combine a base manifest with ordered overlays
//!   (later entries override earlier)

pub mod error;
pub mod hash;
pub mod manifest;
pub mod merge;
pub mod version;

mod decode;
mod encode;

pub use decode::{decode_manifest, decode_manifest_bytes};
pub use encode::encode_manifest;
pub use error::{ManifestError, ValidationError};
pub use hash::{ContentHasher, HashAlgorithm};
pub use manifest::{canonical_order, validate_relative_path, Manifest, PathEntry};
pub use merge::{merge_manifests, merge_overlays};
pub use version::ManifestVersion;
