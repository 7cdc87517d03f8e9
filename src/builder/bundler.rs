//! Bundling: inline an entrypoint's whole import graph into one document.

use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::builder::document::{DocumentKind, DocumentStream, SourceDocument};
use crate::util::fs::{ensure_dir, read_to_string};
use crate::util::process::{find_executable, ProcessBuilder};

/// Default bundler program.
pub const DEFAULT_BUNDLER: &str = "polymer-bundler";

/// Merges every document reachable from an entrypoint into that entrypoint.
pub trait Bundler: Send + Sync {
    /// Bundle `stream` starting at `entrypoint` (a path relative to the
    /// stream root). The returned stream is what gets written back.
    fn bundle(&self, entrypoint: &Path, stream: DocumentStream) -> Result<DocumentStream>;
}

/// Runs an external bundler over a staged copy of the stream.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    program: String,
}

impl Default for CommandBundler {
    fn default() -> Self {
        CommandBundler::new(DEFAULT_BUNDLER)
    }
}

impl CommandBundler {
    pub fn new(program: impl Into<String>) -> Self {
        CommandBundler {
            program: program.into(),
        }
    }

    /// The bundle command: inline scripts and styles, strip comments.
    pub fn bundle_command(
        program: &Path,
        root: &Path,
        entrypoint: &Path,
        out_file: &Path,
    ) -> ProcessBuilder {
        ProcessBuilder::new(program)
            .arg("--root")
            .arg(root)
            .args(["--inline-scripts", "--inline-css", "--strip-comments"])
            .arg("--out-file")
            .arg(out_file)
            .arg(entrypoint)
            .cwd(root)
    }
}

impl Bundler for CommandBundler {
    fn bundle(&self, entrypoint: &Path, stream: DocumentStream) -> Result<DocumentStream> {
        let program = find_executable(&self.program)
            .with_context(|| format!("bundler `{}` not found in PATH", self.program))?;

        let staging = TempDir::new().context("failed to create bundle staging directory")?;
        let src_root = staging.path().join("src");
        let out_file = staging.path().join("out").join(entrypoint);

        stream.write_to(&src_root)?;
        if let Some(parent) = out_file.parent() {
            ensure_dir(parent)?;
        }

        tracing::debug!(
            "bundling {} documents from {}",
            stream.len(),
            entrypoint.display()
        );
        Self::bundle_command(&program, &src_root, entrypoint, &out_file).exec_and_check()?;

        let contents = read_to_string(&out_file)?;
        Ok(DocumentStream::new(vec![SourceDocument::new(
            entrypoint,
            contents,
            DocumentKind::Markup,
        )]))
    }
}
