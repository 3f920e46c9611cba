//! Virtual file system mount helper contract.
//!
//! The mount itself is performed by an external executable. Input sync asks
//! the helper to serve a merged manifest at a root's local directory and
//! falls back to downloading when the helper cannot be found.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Environment variable pointing at the helper's install directory.
pub const VFS_PATH_ENV: &str = "DEADLINE_VFS_PATH";

/// Helper executable, relative to the install directory.
pub const VFS_EXECUTABLE: &str = "deadline_vfs";

/// Errors from locating or starting the mount helper.
#[derive(Debug, Error)]
pub enum MountError {
    /// No helper executable is installed; callers fall back to downloading.
    #[error("Mount helper not found: {searched}")]
    HelperMissing { searched: String },

    #[error("Failed to start mount helper {executable}: {source}")]
    SpawnFailed {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Mount helper exited before the mount was ready: {status}")]
    ExitedEarly { status: String },
}

/// What to mount and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRequest {
    /// Local file holding the encoded manifest to serve.
    pub manifest_path: PathBuf,
    /// Directory the file system is mounted on.
    pub mount_point: PathBuf,
    /// Bucket holding content blobs.
    pub bucket: String,
    /// Key prefix of content blobs.
    pub cas_prefix: String,
}

/// A started mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountHandle {
    pub mount_point: PathBuf,
    /// Process id of the helper, when known.
    pub pid: Option<u32>,
}

/// Locates and drives the external mount helper.
#[async_trait]
pub trait MountHelper: Send + Sync {
    /// Find the helper executable.
    ///
    /// # Errors
    /// Returns `MountError::HelperMissing` if it is not installed.
    fn locate(&self) -> Result<PathBuf, MountError>;

    /// Mount a manifest.
    async fn mount(&self, request: &MountRequest) -> Result<MountHandle, MountError>;
}

/// Whether virtual file system mounts are available on this host.
pub fn host_supports_virtual_fs() -> bool {
    cfg!(target_os = "linux")
}

/// Mount helper backed by the `deadline_vfs` executable.
#[derive(Debug, Clone)]
pub struct ExecutableMountHelper {
    install_dir: Option<PathBuf>,
    startup_grace: Duration,
}

impl ExecutableMountHelper {
    /// Use the install directory named by `DEADLINE_VFS_PATH`.
    pub fn from_env() -> Self {
        Self {
            install_dir: std::env::var_os(VFS_PATH_ENV).map(PathBuf::from),
            startup_grace: Duration::from_millis(500),
        }
    }

    /// Use an explicit install directory.
    pub fn with_install_dir(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: Some(install_dir.into()),
            startup_grace: Duration::from_millis(500),
        }
    }

    /// How long the helper must stay up before the mount counts as started.
    pub fn with_startup_grace(mut self, startup_grace: Duration) -> Self {
        self.startup_grace = startup_grace;
        self
    }
}

#[async_trait]
impl MountHelper for ExecutableMountHelper {
    fn locate(&self) -> Result<PathBuf, MountError> {
        let install_dir: &Path = self.install_dir.as_deref().ok_or_else(|| {
            MountError::HelperMissing {
                searched: format!("{} is not set", VFS_PATH_ENV),
            }
        })?;
        let executable: PathBuf = install_dir.join("bin").join(VFS_EXECUTABLE);
        if executable.is_file() {
            Ok(executable)
        } else {
            Err(MountError::HelperMissing {
                searched: executable.display().to_string(),
            })
        }
    }

    async fn mount(&self, request: &MountRequest) -> Result<MountHandle, MountError> {
        let executable: PathBuf = self.locate()?;
        let spawn_error = |source: std::io::Error| MountError::SpawnFailed {
            executable: executable.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(&request.mount_point)
            .await
            .map_err(spawn_error)?;

        debug!(
            "Starting {} on {}",
            executable.display(),
            request.mount_point.display()
        );
        let mut child: Child = Command::new(&executable)
            .arg(&request.mount_point)
            .arg("-f")
            .arg("--clienttype=deadline")
            .arg(format!("--bucket={}", request.bucket))
            .arg(format!("--manifest={}", request.manifest_path.display()))
            .arg(format!("--casprefix={}", request.cas_prefix))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        match tokio::time::timeout(self.startup_grace, child.wait()).await {
            Ok(Ok(status)) => {
                let status: ExitStatus = status;
                Err(MountError::ExitedEarly {
                    status: status.to_string(),
                })
            }
            Ok(Err(e)) => Err(spawn_error(e)),
            Err(_still_running) => {
                info!("Mounted {}", request.mount_point.display());
                Ok(MountHandle {
                    mount_point: request.mount_point.clone(),
                    pid: child.id(),
                })
            }
        }
    }
}

/// Mount helper for hosts without virtual file system support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMountHelper;

#[async_trait]
impl MountHelper for NoMountHelper {
    fn locate(&self) -> Result<PathBuf, MountError> {
        Err(disabled())
    }

    async fn mount(&self, _request: &MountRequest) -> Result<MountHandle, MountError> {
        Err(disabled())
    }
}

fn disabled() -> MountError {
    MountError::HelperMissing {
        searched: "virtual file system disabled".to_string(),
    }
}
