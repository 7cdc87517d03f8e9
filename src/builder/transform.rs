//! The bundle stage: load, prepare, merge, bundle, write back.
//!
//! Project sources and installed dependencies are two independent streams;
//! both are prepared concurrently and merged before bundling, sources first.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::bundler::Bundler;
use crate::builder::document::DocumentStream;
use crate::builder::splitter;
use crate::core::workspace::{
    BuildWorkspace, DEPENDENCIES_DIR_NAME, DEPENDENCY_MANIFEST_NAME, IMPORT_MANIFEST_NAME,
    INSTALLER_MODULES_DIR_NAME, PACKAGE_LOCK_NAME, PACKAGE_METADATA_NAME,
};

/// Counts reported after a bundle run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    pub source_documents: usize,
    pub dependency_documents: usize,
    pub output_documents: usize,
}

/// Runs the bundle stage over a workspace.
pub struct SourceTransformer<'a> {
    workspace: &'a BuildWorkspace,
    bundler: &'a dyn Bundler,
}

impl<'a> SourceTransformer<'a> {
    pub fn new(workspace: &'a BuildWorkspace, bundler: &'a dyn Bundler) -> Self {
        SourceTransformer { workspace, bundler }
    }

    /// Bundle the workspace's import manifest in place.
    pub fn run(&self) -> Result<TransformSummary> {
        let root = self.workspace.root();
        let deps_dir = self.workspace.dependencies_dir();

        let (sources, dependencies) = rayon::join(
            || load_prepared(root, root, &source_excludes()),
            || {
                if deps_dir.is_dir() {
                    load_prepared(root, &deps_dir, &[])
                } else {
                    Ok(DocumentStream::default())
                }
            },
        );
        let sources = sources.context("failed to prepare project sources")?;
        let dependencies = dependencies.context("failed to prepare installed dependencies")?;

        let mut summary = TransformSummary {
            source_documents: sources.len(),
            dependency_documents: dependencies.len(),
            ..TransformSummary::default()
        };
        tracing::debug!(
            "prepared {} source and {} dependency documents",
            summary.source_documents,
            summary.dependency_documents
        );

        let merged = splitter::merge(sources, dependencies);
        let output = self
            .bundler
            .bundle(Path::new(IMPORT_MANIFEST_NAME), merged)
            .context("bundler failed")?;

        summary.output_documents = output.len();
        output.write_to(root)?;

        Ok(summary)
    }
}

/// Workspace entries that are not project sources.
fn source_excludes() -> Vec<PathBuf> {
    [
        DEPENDENCIES_DIR_NAME,
        INSTALLER_MODULES_DIR_NAME,
        DEPENDENCY_MANIFEST_NAME,
        PACKAGE_METADATA_NAME,
        PACKAGE_LOCK_NAME,
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

fn load_prepared(root: &Path, dir: &Path, exclude: &[PathBuf]) -> Result<DocumentStream> {
    let stream = DocumentStream::load(root, dir, exclude)?;
    Ok(splitter::prepare(stream)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::document::DocumentKind;
    use crate::test_support::MockBundler;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, BuildWorkspace) {
        let tmp = TempDir::new().unwrap();
        let ws = BuildWorkspace::create(tmp.path().join("_arctmp")).unwrap();
        (tmp, ws)
    }

    #[test]
    fn test_sources_precede_dependencies() {
        let (_tmp, ws) = workspace();
        fs::write(ws.import_manifest_path(), "<link rel=\"import\">\n").unwrap();
        fs::create_dir_all(ws.dependencies_dir().join("paper-fab")).unwrap();
        fs::write(
            ws.dependencies_dir().join("paper-fab/paper-fab.html"),
            "<script>if (a-->0) {}</script>",
        )
        .unwrap();

        let bundler = MockBundler::new();
        let summary = SourceTransformer::new(&ws, &bundler).run().unwrap();

        assert_eq!(summary.source_documents, 1);
        assert_eq!(summary.dependency_documents, 1);

        let seen = bundler.received();
        let paths: Vec<_> = seen.iter().map(|d| d.path.clone()).collect();
        assert_eq!(
            paths,
            [
                PathBuf::from("import.html"),
                PathBuf::from("bower_components/paper-fab/paper-fab.html"),
            ]
        );
        // Inline scripts were fixed before reaching the bundler.
        assert_eq!(seen[1].contents, "<script>if (a-- >0) {}</script>");
        assert_eq!(seen[1].kind, DocumentKind::Markup);
    }

    #[test]
    fn test_output_written_back() {
        let (_tmp, ws) = workspace();
        fs::write(ws.import_manifest_path(), "<link>\n").unwrap();

        let bundler = MockBundler::new().with_output("<bundled>");
        let summary = SourceTransformer::new(&ws, &bundler).run().unwrap();

        assert_eq!(summary.output_documents, 1);
        assert_eq!(
            fs::read_to_string(ws.import_manifest_path()).unwrap(),
            "<bundled>"
        );
    }

    #[test]
    fn test_build_only_files_are_not_sources() {
        let (_tmp, ws) = workspace();
        fs::write(ws.import_manifest_path(), "<link>\n").unwrap();
        fs::create_dir_all(ws.installer_modules_dir().join("bower")).unwrap();
        fs::write(ws.installer_modules_dir().join("bower/index.js"), "x").unwrap();

        let bundler = MockBundler::new();
        let summary = SourceTransformer::new(&ws, &bundler).run().unwrap();

        assert_eq!(summary.source_documents, 1);
        assert_eq!(summary.dependency_documents, 0);
    }

    #[test]
    fn test_split_failure_skips_bundler() {
        let (_tmp, ws) = workspace();
        fs::write(ws.import_manifest_path(), "<link>\n").unwrap();
        fs::write(ws.root().join("x.html"), "<script>x()</script>").unwrap();
        fs::write(ws.root().join("x.html_script_0.js"), "y()").unwrap();

        let bundler = MockBundler::new();
        let err = SourceTransformer::new(&ws, &bundler).run().unwrap_err();

        assert!(err.to_string().contains("failed to prepare project sources"));
        assert!(err
            .chain()
            .any(|cause| cause.to_string().contains("collides with an existing document")));
        assert!(bundler.received().is_empty());
        assert_eq!(
            fs::read_to_string(ws.import_manifest_path()).unwrap(),
            "<link>\n"
        );
    }

    #[test]
    fn test_bundler_failure() {
        let (_tmp, ws) = workspace();
        fs::write(ws.import_manifest_path(), "<link>\n").unwrap();

        let bundler = MockBundler::failing();
        let err = SourceTransformer::new(&ws, &bundler).run().unwrap_err();
        assert!(err.to_string().contains("bundler failed"));
    }
}
