//! Local destination resolution for asset roots.
//!
//! Each root a job references is materialized under the session directory
//! in `assetroot-<20 hex digits>`, named from a hash of the root's identity
//! (root path plus location name). Storage-profile overrides replace the
//! generated directory for roots that belong to a named file system location.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use asset_sync_model::HashAlgorithm;

use crate::types::{ManifestProperties, PathFormat, PathMappingRule};

/// Prefix of generated destination directory names.
pub const DESTINATION_DIR_PREFIX: &str = "assetroot-";

/// Hex digits of the identity hash kept in a destination directory name.
const DESTINATION_HASH_LEN: usize = 20;

/// Where a root is materialized locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRoot {
    /// Generated directory under the session directory; gets a mapping rule.
    Generated(PathBuf),
    /// Path supplied by a storage-profile override; the task already knows it.
    Overridden(PathBuf),
}

impl ResolvedRoot {
    /// Local directory the root's files live in.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedRoot::Generated(p) | ResolvedRoot::Overridden(p) => p,
        }
    }

    /// Whether a path mapping rule should be emitted for this root.
    pub fn needs_rule(&self) -> bool {
        matches!(self, ResolvedRoot::Generated(_))
    }
}

/// Assigns local directories to asset roots for one sync session.
#[derive(Debug)]
pub struct DestinationResolver {
    session_dir: PathBuf,
    overrides: HashMap<String, String>,
    assigned: HashMap<String, PathBuf>,
    used_names: HashSet<String>,
}

impl DestinationResolver {
    /// Create a resolver rooted at a session directory.
    ///
    /// # Arguments
    /// * `session_dir` - Directory generated roots are created under
    /// * `overrides` - Storage-profile mapping from submitted root path to local path
    pub fn new(session_dir: impl Into<PathBuf>, overrides: HashMap<String, String>) -> Self {
        Self {
            session_dir: session_dir.into(),
            overrides,
            assigned: HashMap::new(),
            used_names: HashSet::new(),
        }
    }

    /// Resolve the local root for a manifest entry.
    pub fn resolve(&mut self, props: &ManifestProperties) -> ResolvedRoot {
        self.resolve_root(&props.root_path, props.file_system_location_name.as_deref())
    }

    /// Resolve the local root for a root path and optional location name.
    ///
    /// Overrides only apply to roots with a location name. Repeated calls
    /// with the same identity return the same directory.
    pub fn resolve_root(&mut self, root_path: &str, location_name: Option<&str>) -> ResolvedRoot {
        if location_name.is_some() {
            if let Some(local) = self.overrides.get(root_path) {
                return ResolvedRoot::Overridden(PathBuf::from(local));
            }
        }

        let identity: String = root_identity(root_path, location_name);
        if let Some(existing) = self.assigned.get(&identity) {
            return ResolvedRoot::Generated(existing.clone());
        }

        let base_name: String = destination_dir_name(&identity);
        let mut name: String = base_name.clone();
        let mut suffix: u32 = 1;
        while self.used_names.contains(&name) {
            name = format!("{}-{}", base_name, suffix);
            suffix += 1;
        }

        let path: PathBuf = self.session_dir.join(&name);
        self.used_names.insert(name);
        self.assigned.insert(identity, path.clone());
        ResolvedRoot::Generated(path)
    }
}

/// Identity of a root: its path qualified by location name, when present.
fn root_identity(root_path: &str, location_name: Option<&str>) -> String {
    match location_name {
        Some(name) => format!("{}\u{0}{}", name, root_path),
        None => root_path.to_string(),
    }
}

/// Directory name for a root identity.
pub fn destination_dir_name(identity: &str) -> String {
    let digest: String = HashAlgorithm::Xxh128.hash_bytes(identity.as_bytes());
    format!(
        "{}{}",
        DESTINATION_DIR_PREFIX,
        &digest[..DESTINATION_HASH_LEN]
    )
}

/// Rule mapping a submitted root onto its local directory.
pub fn build_rule(
    source_path_format: PathFormat,
    source_path: &str,
    destination: &Path,
) -> PathMappingRule {
    PathMappingRule {
        source_path_format,
        source_path: source_path.to_string(),
        destination_path: destination.display().to_string(),
    }
}
