//! Path joining and conversion relative to an asset root.

use std::path::{Component, Path, PathBuf};

use asset_sync_model::validate_relative_path;

use crate::error::FileSystemError;

/// Join a manifest-relative path onto a local root, component by component.
///
/// The relative path always uses `/` separators; the result uses host-native
/// separators.
///
/// # Errors
/// - `FileSystemError::PathOutsideRoot` if the path is absolute or escapes `root`
/// - `FileSystemError::InvalidPath` if the path is empty, or on Windows if a
///   component holds `\` or `:`
pub fn join_relative(root: &Path, relative: &str) -> Result<PathBuf, FileSystemError> {
    match validate_relative_path(relative) {
        Ok(()) => {}
        Err(asset_sync_model::ValidationError::AbsolutePath { .. })
        | Err(asset_sync_model::ValidationError::EscapingPath { .. }) => {
            return Err(FileSystemError::PathOutsideRoot {
                path: relative.to_string(),
                root: root.display().to_string(),
            });
        }
        Err(_) => {
            return Err(FileSystemError::InvalidPath {
                path: relative.to_string(),
            });
        }
    }

    let mut joined: PathBuf = root.to_path_buf();
    for component in relative.split('/') {
        match component {
            "" | "." => continue,
            part if !is_host_component(part) => {
                return Err(FileSystemError::InvalidPath {
                    path: relative.to_string(),
                });
            }
            part => joined.push(part),
        }
    }
    Ok(joined)
}

/// Whether a `/`-free component names a single entry on this host.
///
/// On Windows `\` is a separator and `:` starts a drive prefix or stream.
#[cfg(windows)]
fn is_host_component(component: &str) -> bool {
    !component.contains(['\\', ':'])
}

#[cfg(not(windows))]
fn is_host_component(_component: &str) -> bool {
    true
}

/// Convert a path under `root` to a `/`-separated relative path.
///
/// # Errors
/// Returns `FileSystemError::PathOutsideRoot` if `path` is not under `root`,
/// or `FileSystemError::InvalidPath` if a component is not valid UTF-8.
pub fn to_posix_relative(root: &Path, path: &Path) -> Result<String, FileSystemError> {
    let relative: &Path = path
        .strip_prefix(root)
        .map_err(|_| FileSystemError::PathOutsideRoot {
            path: path.display().to_string(),
            root: root.display().to_string(),
        })?;

    let mut parts: Vec<&str> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part: &str = part.to_str().ok_or_else(|| FileSystemError::InvalidPath {
                    path: path.display().to_string(),
                })?;
                parts.push(part);
            }
            Component::CurDir => {}
            _ => {
                return Err(FileSystemError::PathOutsideRoot {
                    path: path.display().to_string(),
                    root: root.display().to_string(),
                });
            }
        }
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_relative_nested() {
        let root: PathBuf = PathBuf::from("/tmp/session/assetroot-abc");
        let joined: PathBuf = join_relative(&root, "scene/textures/wood.png").unwrap();
        assert_eq!(
            joined,
            root.join("scene").join("textures").join("wood.png")
        );
    }

    #[test]
    fn test_join_relative_rejects_escape() {
        let root: PathBuf = PathBuf::from("/tmp/root");
        assert!(matches!(
            join_relative(&root, "../outside.txt"),
            Err(FileSystemError::PathOutsideRoot { .. })
        ));
        assert!(matches!(
            join_relative(&root, "/etc/passwd"),
            Err(FileSystemError::PathOutsideRoot { .. })
        ));
        assert!(matches!(
            join_relative(&root, ""),
            Err(FileSystemError::InvalidPath { .. })
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_join_relative_keeps_posix_only_names() {
        let root: PathBuf = PathBuf::from("/tmp/root");
        assert_eq!(
            join_relative(&root, "c:notes.txt").unwrap(),
            root.join("c:notes.txt")
        );
        assert_eq!(
            join_relative(&root, "out/a\\b.txt").unwrap(),
            root.join("out").join("a\\b.txt")
        );
    }

    #[cfg(windows)]
    #[test]
    fn test_join_relative_refuses_windows_specials() {
        let root: PathBuf = PathBuf::from("C:\\session\\root");
        assert!(matches!(
            join_relative(&root, "c:notes.txt"),
            Err(FileSystemError::InvalidPath { .. })
        ));
        assert!(matches!(
            join_relative(&root, "out/a\\b.txt"),
            Err(FileSystemError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_to_posix_relative() {
        let root: PathBuf = PathBuf::from("/data/root");
        let file: PathBuf = root.join("out").join("frame_0001.exr");
        assert_eq!(to_posix_relative(&root, &file).unwrap(), "out/frame_0001.exr");
    }

    #[test]
    fn test_to_posix_relative_outside_root() {
        let root: PathBuf = PathBuf::from("/data/root");
        assert!(matches!(
            to_posix_relative(&root, Path::new("/data/other/file")),
            Err(FileSystemError::PathOutsideRoot { .. })
        ));
    }
}
