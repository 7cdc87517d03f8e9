//! Build workspace - the staging directory of a build.
//!
//! Everything a build produces lands in the workspace first: manifests,
//! installed dependencies, the theme file and bundled output. Post-build the
//! whole directory is moved to the destination.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default workspace directory name, relative to the invocation directory.
pub const WORKSPACE_DIR_NAME: &str = "_arctmp";

/// Dependency manifest read by the installer.
pub const DEPENDENCY_MANIFEST_NAME: &str = "bower.json";

/// Import manifest, also the bundler entrypoint.
pub const IMPORT_MANIFEST_NAME: &str = "import.html";

/// Directory the installer puts dependencies in.
pub const DEPENDENCIES_DIR_NAME: &str = "bower_components";

/// Metadata written when the installer itself has to be provisioned.
pub const PACKAGE_METADATA_NAME: &str = "package.json";

/// Lock file the fallback package manager may leave behind.
pub const PACKAGE_LOCK_NAME: &str = "package-lock.json";

/// Modules of a locally provisioned installer.
pub const INSTALLER_MODULES_DIR_NAME: &str = "node_modules";

/// Filesystem error while managing the workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to remove stale workspace `{}`", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create workspace `{}`", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The staging directory of a build.
#[derive(Debug, Clone)]
pub struct BuildWorkspace {
    root: PathBuf,
}

impl BuildWorkspace {
    /// Create a fresh, empty workspace at `root`, destroying any previous one.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let root = root.into();

        if root.exists() {
            tracing::debug!("removing stale workspace {}", root.display());
            fs::remove_dir_all(&root).map_err(|source| WorkspaceError::Remove {
                path: root.clone(),
                source,
            })?;
        }

        fs::create_dir_all(&root).map_err(|source| WorkspaceError::Create {
            path: root.clone(),
            source,
        })?;

        Ok(BuildWorkspace { root })
    }

    /// Workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dependency_manifest_path(&self) -> PathBuf {
        self.root.join(DEPENDENCY_MANIFEST_NAME)
    }

    pub fn import_manifest_path(&self) -> PathBuf {
        self.root.join(IMPORT_MANIFEST_NAME)
    }

    /// Where installed dependencies live.
    pub fn dependencies_dir(&self) -> PathBuf {
        self.root.join(DEPENDENCIES_DIR_NAME)
    }

    pub fn package_metadata_path(&self) -> PathBuf {
        self.root.join(PACKAGE_METADATA_NAME)
    }

    pub fn installer_modules_dir(&self) -> PathBuf {
        self.root.join(INSTALLER_MODULES_DIR_NAME)
    }

    /// Remove the workspace directory if it still exists.
    pub fn destroy(&self) -> Result<(), WorkspaceError> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|source| WorkspaceError::Remove {
                path: self.root.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Files and directories that only exist to drive the build.
pub fn build_only_entries() -> [&'static str; 4] {
    [
        DEPENDENCY_MANIFEST_NAME,
        PACKAGE_METADATA_NAME,
        PACKAGE_LOCK_NAME,
        INSTALLER_MODULES_DIR_NAME,
    ]
}
