//! Dependency installation.
//!
//! Installation is delegated to an external package manager which reads the
//! workspace's `bower.json` and fills `bower_components/`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::workspace::INSTALLER_MODULES_DIR_NAME;
use crate::util::logger::BuildLogger;
use crate::util::process::{find_executable, find_executable_in, ProcessBuilder};

/// Default installer program.
pub const DEFAULT_INSTALLER: &str = "bower";

/// Program used to provision the installer when it is not on `PATH`.
pub const DEFAULT_INSTALLER_FALLBACK: &str = "npm";

/// Options forwarded to the installer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub verbose: bool,
}

/// Installs the dependencies declared in a workspace.
pub trait DependencyInstaller: Send + Sync {
    /// Install every dependency of `workspace`'s manifest into the workspace.
    fn install(&self, workspace: &Path, logger: &dyn BuildLogger, opts: &InstallOptions)
        -> Result<()>;
}

/// Runs `bower install` in the workspace.
#[derive(Debug, Clone)]
pub struct BowerInstaller {
    program: String,
    fallback: Option<String>,
}

impl Default for BowerInstaller {
    fn default() -> Self {
        BowerInstaller::new(DEFAULT_INSTALLER).with_fallback(DEFAULT_INSTALLER_FALLBACK)
    }
}

impl BowerInstaller {
    pub fn new(program: impl Into<String>) -> Self {
        BowerInstaller {
            program: program.into(),
            fallback: None,
        }
    }

    /// Package manager used to install the installer locally when missing.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// The install command for a resolved installer program.
    pub fn install_command(program: &Path, workspace: &Path, opts: &InstallOptions) -> ProcessBuilder {
        let pb = ProcessBuilder::new(program)
            .arg("install")
            .arg("--config.interactive=false")
            .cwd(workspace);

        if opts.verbose {
            pb.arg("--verbose")
        } else {
            pb.arg("--quiet")
        }
    }

    fn resolve_program(&self, workspace: &Path, logger: &dyn BuildLogger) -> Result<PathBuf> {
        if let Some(path) = find_executable(&self.program) {
            return Ok(path);
        }

        let Some(fallback) = self.fallback.as_deref() else {
            bail!("dependency installer `{}` not found in PATH", self.program);
        };
        let Some(fallback_path) = find_executable(fallback) else {
            bail!(
                "dependency installer `{}` not found in PATH, and `{}` is not available to install it",
                self.program,
                fallback
            );
        };

        logger.info(&format!(
            "`{}` not found, installing it locally with `{}`...",
            self.program, fallback
        ));
        ProcessBuilder::new(fallback_path)
            .args(["install", self.program.as_str()])
            .cwd(workspace)
            .exec_and_check()?;

        let bin_dir = workspace.join(INSTALLER_MODULES_DIR_NAME).join(".bin");
        match find_executable_in(&self.program, &bin_dir) {
            Some(path) => Ok(path),
            None => bail!(
                "`{}` was installed but no executable was found in {}",
                self.program,
                bin_dir.display()
            ),
        }
    }
}

impl DependencyInstaller for BowerInstaller {
    fn install(
        &self,
        workspace: &Path,
        logger: &dyn BuildLogger,
        opts: &InstallOptions,
    ) -> Result<()> {
        let program = self.resolve_program(workspace, logger)?;

        logger.info("Installing dependencies...");
        let output = Self::install_command(&program, workspace, opts).exec_and_check()?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            logger.log(line);
        }
        if opts.verbose {
            for line in String::from_utf8_lossy(&output.stderr).lines() {
                logger.log(line);
            }
        }

        logger.info("Dependencies installed.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingLogger;
    use tempfile::TempDir;

    #[test]
    fn test_install_command() {
        let quiet = BowerInstaller::install_command(
            Path::new("bower"),
            Path::new("/ws"),
            &InstallOptions::default(),
        );
        assert_eq!(
            quiet.display_command(),
            "bower install --config.interactive=false --quiet"
        );

        let verbose = BowerInstaller::install_command(
            Path::new("bower"),
            Path::new("/ws"),
            &InstallOptions { verbose: true },
        );
        assert!(verbose.display_command().ends_with("--verbose"));
    }

    #[test]
    fn test_missing_installer_without_fallback() {
        let tmp = TempDir::new().unwrap();
        let logger = RecordingLogger::new();
        let installer = BowerInstaller::new("arc-builder-no-such-installer");

        let err = installer
            .install(tmp.path(), &logger, &InstallOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("not found in PATH"));
    }

    #[test]
    fn test_missing_installer_and_fallback() {
        let tmp = TempDir::new().unwrap();
        let logger = RecordingLogger::new();
        let installer = BowerInstaller::new("arc-builder-no-such-installer")
            .with_fallback("arc-builder-no-such-fallback");

        let err = installer
            .install(tmp.path(), &logger, &InstallOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("arc-builder-no-such-fallback"));
    }

    #[test]
    #[cfg(unix)]
    fn test_install_runs_program() {
        let tmp = TempDir::new().unwrap();
        let logger = RecordingLogger::new();

        // `true` ignores its arguments and succeeds.
        BowerInstaller::new("true")
            .install(tmp.path(), &logger, &InstallOptions::default())
            .unwrap();

        assert!(logger.contains("Dependencies installed."));
    }
}
