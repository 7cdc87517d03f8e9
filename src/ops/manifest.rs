//! Dependency manifest (`bower.json`) generation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::dependency::{DependencyReference, DependencyScope, MissingNameError};
use crate::core::workspace::IMPORT_MANIFEST_NAME;
use crate::util::fs::write_string;

/// Package name written into the manifest.
pub const MANIFEST_PACKAGE_NAME: &str = "arc-components";

/// Package version written into the manifest.
pub const MANIFEST_PACKAGE_VERSION: &str = "1.0.0";

/// Dependency manifest consumed by the installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    pub name: String,
    pub version: String,
    /// Set so the installer does not warn about a missing entrypoint.
    pub main: String,
    pub dependencies: BTreeMap<String, String>,
}

impl DependencyManifest {
    /// Build the manifest for the declared component lists.
    pub fn new(default_refs: &[String], extra_refs: &[String]) -> Result<Self, MissingNameError> {
        Ok(DependencyManifest {
            name: MANIFEST_PACKAGE_NAME.to_string(),
            version: MANIFEST_PACKAGE_VERSION.to_string(),
            main: IMPORT_MANIFEST_NAME.to_string(),
            dependencies: build_manifest(default_refs, extra_refs)?,
        })
    }

    /// Write the manifest as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .context("failed to serialize dependency manifest")?;
        write_string(path, &contents)?;
        tracing::debug!("wrote dependency manifest {}", path.display());
        Ok(())
    }
}

/// Map every declared component's short name to its resolved reference.
///
/// Default-scope entries are inserted first and extra entries second, so an
/// extra entry replaces a default entry with the same short name.
pub fn build_manifest(
    default_refs: &[String],
    extra_refs: &[String],
) -> Result<BTreeMap<String, String>, MissingNameError> {
    let defaults = DependencyReference::parse_all(default_refs, DependencyScope::Default)?;
    let extras = DependencyReference::parse_all(extra_refs, DependencyScope::Extra)?;

    let mut dependencies = BTreeMap::new();
    for dep in defaults.iter().chain(extras.iter()) {
        if let Some(previous) =
            dependencies.insert(dep.short_name().to_string(), dep.resolved_name().to_string())
        {
            tracing::debug!(
                "`{}` overrides `{}` for `{}`",
                dep.resolved_name(),
                previous,
                dep.short_name()
            );
        }
    }

    Ok(dependencies)
}
