//! Framework wrapper generation.
//!
//! Wrappers expose the bundled web components as framework components. The
//! generator is an external tool; this module only describes what to ask it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::logger::BuildLogger;
use crate::util::process::{find_executable, ProcessBuilder};

/// Default wrapper generator program.
pub const DEFAULT_WRAPPER_GENERATOR: &str = "wc-reactor";

/// File name of the bundled wrapper output.
pub const WRAPPER_BUNDLE_NAME: &str = "ArcComponents.js";

/// A request to generate wrappers for an import document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperRequest {
    /// The import document whose components get wrapped.
    pub entrypoint_import_path: PathBuf,
    /// Where the generated files go.
    pub destination: PathBuf,
    /// Only wrap these components; everything when `None`.
    pub component_subset: Option<Vec<String>>,
    /// Bundle all wrappers into a single file with this name.
    pub bundle_name: Option<String>,
}

impl WrapperRequest {
    pub fn new(entrypoint_import_path: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        WrapperRequest {
            entrypoint_import_path: entrypoint_import_path.into(),
            destination: destination.into(),
            component_subset: None,
            bundle_name: None,
        }
    }

    pub fn with_components(mut self, components: Vec<String>) -> Self {
        self.component_subset = Some(components);
        self
    }

    pub fn with_bundle(mut self, name: impl Into<String>) -> Self {
        self.bundle_name = Some(name.into());
        self
    }
}

/// Generates framework wrappers.
pub trait WrapperGenerator: Send + Sync {
    fn generate(&self, request: &WrapperRequest, logger: &dyn BuildLogger) -> Result<()>;
}

/// Runs an external wrapper generator.
#[derive(Debug, Clone)]
pub struct CommandWrapperGenerator {
    program: String,
}

impl Default for CommandWrapperGenerator {
    fn default() -> Self {
        CommandWrapperGenerator::new(DEFAULT_WRAPPER_GENERATOR)
    }
}

impl CommandWrapperGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        CommandWrapperGenerator {
            program: program.into(),
        }
    }

    pub fn generate_command(program: &Path, request: &WrapperRequest) -> ProcessBuilder {
        let mut pb = ProcessBuilder::new(program)
            .arg("--web-component")
            .arg(&request.entrypoint_import_path)
            .arg("--dest")
            .arg(&request.destination);

        if let Some(ref components) = request.component_subset {
            pb = pb.arg("--components").arg(components.join(","));
        }
        if let Some(ref name) = request.bundle_name {
            pb = pb.arg("--bundle").arg("--bundle-name").arg(name);
        }

        pb
    }
}

impl WrapperGenerator for CommandWrapperGenerator {
    fn generate(&self, request: &WrapperRequest, logger: &dyn BuildLogger) -> Result<()> {
        let program = find_executable(&self.program)
            .with_context(|| format!("wrapper generator `{}` not found in PATH", self.program))?;

        let output = Self::generate_command(&program, request).exec_and_check()?;
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            logger.log(line);
        }
        Ok(())
    }
}
