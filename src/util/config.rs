//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.arc-builder/config.toml` - User-wide defaults
//! - Project: `.arc-builder/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. These files select
//! the external tools and workspace paths; build options themselves come
//! from the command line or an options file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::bundler::{CommandBundler, DEFAULT_BUNDLER};
use crate::builder::installer::{BowerInstaller, DEFAULT_INSTALLER, DEFAULT_INSTALLER_FALLBACK};
use crate::builder::wrapper::{CommandWrapperGenerator, DEFAULT_WRAPPER_GENERATOR};
use crate::core::workspace::WORKSPACE_DIR_NAME;

/// Name of the configuration directory, under home or the project root.
pub const CONFIG_DIR_NAME: &str = ".arc-builder";

/// Default name of the build's debug log.
pub const DEBUG_LOG_NAME: &str = "arc-components-builder.log";

/// Builder configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tools
    pub tools: ToolsConfig,

    /// Workspace settings
    pub build: BuildSettings,
}

/// External programs invoked by the build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Dependency installer (default `bower`)
    pub installer: Option<String>,

    /// Package manager used to provision the installer (default `npm`)
    pub installer_fallback: Option<String>,

    /// Bundler (default `polymer-bundler`)
    pub bundler: Option<String>,

    /// Wrapper generator (default `wc-reactor`)
    pub wrapper: Option<String>,
}

/// Workspace settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Workspace directory name (default `_arctmp`)
    pub workspace_dir: Option<String>,

    /// Debug log file name (default `arc-components-builder.log`)
    pub debug_log: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.tools.installer.is_some() {
            self.tools.installer = other.tools.installer;
        }
        if other.tools.installer_fallback.is_some() {
            self.tools.installer_fallback = other.tools.installer_fallback;
        }
        if other.tools.bundler.is_some() {
            self.tools.bundler = other.tools.bundler;
        }
        if other.tools.wrapper.is_some() {
            self.tools.wrapper = other.tools.wrapper;
        }

        if other.build.workspace_dir.is_some() {
            self.build.workspace_dir = other.build.workspace_dir;
        }
        if other.build.debug_log.is_some() {
            self.build.debug_log = other.build.debug_log;
        }
    }

    pub fn workspace_dir(&self) -> &str {
        self.build.workspace_dir.as_deref().unwrap_or(WORKSPACE_DIR_NAME)
    }

    pub fn debug_log(&self) -> &str {
        self.build.debug_log.as_deref().unwrap_or(DEBUG_LOG_NAME)
    }

    /// The configured dependency installer.
    pub fn installer(&self) -> BowerInstaller {
        let program = self.tools.installer.as_deref().unwrap_or(DEFAULT_INSTALLER);
        let fallback = self
            .tools
            .installer_fallback
            .as_deref()
            .unwrap_or(DEFAULT_INSTALLER_FALLBACK);
        BowerInstaller::new(program).with_fallback(fallback)
    }

    /// The configured bundler.
    pub fn bundler(&self) -> CommandBundler {
        CommandBundler::new(self.tools.bundler.as_deref().unwrap_or(DEFAULT_BUNDLER))
    }

    /// The configured wrapper generator.
    pub fn wrapper_generator(&self) -> CommandWrapperGenerator {
        CommandWrapperGenerator::new(
            self.tools
                .wrapper
                .as_deref()
                .unwrap_or(DEFAULT_WRAPPER_GENERATOR),
        )
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.arc-builder/config.toml)
/// 2. Global config (~/.arc-builder/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global config directory (~/.arc-builder).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the global config path (~/.arc-builder/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.arc-builder/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join("config.toml")
}
