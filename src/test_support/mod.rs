//! Test utilities and mocks for builder unit tests.
//!
//! Mock collaborators record what they were asked to do and share that
//! record between clones, so a test can hand a clone to the builder and
//! inspect the original afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use arc_builder::test_support::{MockInstaller, RecordingLogger};
//!
//! let installer = MockInstaller::new();
//! let builder = ArcBuilder::new(config, &ctx).with_installer(Box::new(installer.clone()));
//! // ...
//! assert_eq!(installer.calls(), 1);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};

use crate::builder::bundler::Bundler;
use crate::builder::document::{DocumentStream, SourceDocument};
use crate::builder::installer::{DependencyInstaller, InstallOptions};
use crate::builder::wrapper::{WrapperGenerator, WrapperRequest};
use crate::core::workspace::{DEPENDENCIES_DIR_NAME, DEPENDENCY_MANIFEST_NAME};
use crate::util::logger::BuildLogger;

/// Logger that keeps every message, prefixed with its level.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        RecordingLogger::default()
    }

    /// All recorded lines, as `level: message`.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Whether any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }

    fn record(&self, level: &str, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("{}: {}", level, message));
    }
}

impl BuildLogger for RecordingLogger {
    fn log(&self, message: &str) {
        self.record("log", message);
    }

    fn info(&self, message: &str) {
        self.record("info", message);
    }

    fn warn(&self, message: &str) {
        self.record("warn", message);
    }

    fn error(&self, message: &str) {
        self.record("error", message);
    }
}

#[derive(Debug, Default)]
struct InstallerState {
    calls: usize,
    manifests: Vec<String>,
    options: Vec<InstallOptions>,
}

/// Installer that "installs" each manifest dependency as a one-file component.
#[derive(Debug, Clone, Default)]
pub struct MockInstaller {
    state: Arc<Mutex<InstallerState>>,
    failure: Option<String>,
}

impl MockInstaller {
    pub fn new() -> Self {
        MockInstaller::default()
    }

    /// An installer that always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        MockInstaller {
            failure: Some(message.into()),
            ..MockInstaller::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    /// Manifest contents seen by each call.
    pub fn manifests(&self) -> Vec<String> {
        self.state.lock().unwrap().manifests.clone()
    }

    pub fn options(&self) -> Vec<InstallOptions> {
        self.state.lock().unwrap().options.clone()
    }
}

impl DependencyInstaller for MockInstaller {
    fn install(
        &self,
        workspace: &Path,
        logger: &dyn BuildLogger,
        opts: &InstallOptions,
    ) -> Result<()> {
        let manifest = fs::read_to_string(workspace.join(DEPENDENCY_MANIFEST_NAME))
            .context("mock installer could not read the manifest")?;
        {
            let mut state = self.state.lock().unwrap();
            state.calls += 1;
            state.manifests.push(manifest.clone());
            state.options.push(*opts);
        }

        if let Some(ref message) = self.failure {
            bail!("{}", message);
        }

        let parsed: serde_json::Value = serde_json::from_str(&manifest)?;
        let dependencies: BTreeMap<String, String> =
            serde_json::from_value(parsed["dependencies"].clone())?;

        let deps_dir = workspace.join(DEPENDENCIES_DIR_NAME);
        fs::create_dir_all(&deps_dir)?;
        for name in dependencies.keys() {
            let dir = deps_dir.join(name);
            fs::create_dir_all(&dir)?;
            fs::write(
                dir.join(format!("{}.html", name)),
                format!("<dom-module id=\"{}\"></dom-module>\n", name),
            )?;
            logger.log(&format!("installed {}", name));
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
struct BundlerState {
    received: Vec<SourceDocument>,
}

/// Bundler that records its input and returns a fixed entrypoint document.
#[derive(Debug, Clone, Default)]
pub struct MockBundler {
    state: Arc<Mutex<BundlerState>>,
    output: Option<String>,
    fail: bool,
}

impl MockBundler {
    pub fn new() -> Self {
        MockBundler::default()
    }

    /// Replace the entrypoint's contents with `output`.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn failing() -> Self {
        MockBundler {
            fail: true,
            ..MockBundler::default()
        }
    }

    /// Documents passed to the last `bundle` call.
    pub fn received(&self) -> Vec<SourceDocument> {
        self.state.lock().unwrap().received.clone()
    }
}

impl Bundler for MockBundler {
    fn bundle(&self, entrypoint: &Path, stream: DocumentStream) -> Result<DocumentStream> {
        self.state.lock().unwrap().received = stream.documents().to_vec();

        if self.fail {
            bail!("mock bundler failure");
        }

        let Some(entry) = stream.iter().find(|d| d.path == entrypoint) else {
            bail!("entrypoint {} is not in the stream", entrypoint.display());
        };
        let contents = self.output.clone().unwrap_or_else(|| entry.contents.clone());

        Ok(DocumentStream::new(vec![SourceDocument::new(
            entrypoint,
            contents,
            entry.kind,
        )]))
    }
}

/// Wrapper generator that records requests and writes one marker file.
#[derive(Debug, Clone, Default)]
pub struct MockWrapperGenerator {
    requests: Arc<Mutex<Vec<WrapperRequest>>>,
}

impl MockWrapperGenerator {
    pub fn new() -> Self {
        MockWrapperGenerator::default()
    }

    pub fn requests(&self) -> Vec<WrapperRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl WrapperGenerator for MockWrapperGenerator {
    fn generate(&self, request: &WrapperRequest, logger: &dyn BuildLogger) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());

        let name = request.bundle_name.as_deref().unwrap_or("wrappers.js");
        fs::write(request.destination.join(name), "export {};\n")?;
        logger.log(&format!("generated {}", name));
        Ok(())
    }
}
