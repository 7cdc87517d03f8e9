//! Implementation of `arc-builder build`.
//!
//! A build runs a fixed sequence of stages against a staging workspace:
//!
//! ```text
//! Init -> PrepareBuild -> PerformBuild -> PostBuild -> Cleanup -> Done
//! ```
//!
//! Any failure moves the build to `Failed` and no further stage runs. The
//! workspace and the debug log are left behind on failure.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};

use crate::builder::bundler::Bundler;
use crate::builder::installer::{DependencyInstaller, InstallOptions};
use crate::builder::transform::SourceTransformer;
use crate::builder::wrapper::{WrapperGenerator, WrapperRequest, WRAPPER_BUNDLE_NAME};
use crate::core::options::BuildConfiguration;
use crate::core::workspace::{build_only_entries, BuildWorkspace};
use crate::ops::error::BuildError;
use crate::ops::imports::{build_imports, render_imports};
use crate::ops::manifest::DependencyManifest;
use crate::util::context::GlobalContext;
use crate::util::fs::{is_inside, move_dir, normalize_path, remove_path_if_exists, write_string};
use crate::util::logger::{logger_from_spec, BuildLogger, TracingLogger};

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    PrepareBuild,
    PerformBuild,
    PostBuild,
    Cleanup,
    Done,
    Failed,
}

impl Stage {
    /// The stage that follows this one on success. `Done` and `Failed` are final.
    pub fn next(self) -> Stage {
        match self {
            Stage::Init => Stage::PrepareBuild,
            Stage::PrepareBuild => Stage::PerformBuild,
            Stage::PerformBuild => Stage::PostBuild,
            Stage::PostBuild => Stage::Cleanup,
            Stage::Cleanup => Stage::Done,
            Stage::Done => Stage::Done,
            Stage::Failed => Stage::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::PrepareBuild => "prepare-build",
            Stage::PerformBuild => "perform-build",
            Stage::PostBuild => "post-build",
            Stage::Cleanup => "cleanup",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Where the output was placed
    pub destination: PathBuf,
    /// Stages that completed, in order
    pub stages: Vec<Stage>,
    /// Number of entries in the dependency manifest
    pub dependencies: usize,
    /// Number of lines in the import manifest
    pub imports: usize,
    /// Whether the bundle stage ran
    pub bundled: bool,
    /// Whether wrappers were generated
    pub wrapper_generated: bool,
}

impl BuildReport {
    fn new(destination: PathBuf) -> Self {
        BuildReport {
            destination,
            stages: Vec::new(),
            dependencies: 0,
            imports: 0,
            bundled: false,
            wrapper_generated: false,
        }
    }
}

/// A single build of the components bundle.
pub struct ArcBuilder {
    config: BuildConfiguration,
    workspace_root: PathBuf,
    destination: PathBuf,
    theme_file: Option<PathBuf>,
    debug_log: PathBuf,
    start_dir: PathBuf,
    logger: Arc<dyn BuildLogger>,
    installer: Box<dyn DependencyInstaller>,
    bundler: Box<dyn Bundler>,
    wrapper: Box<dyn WrapperGenerator>,
    stage: Stage,
}

impl ArcBuilder {
    /// Create a build with the collaborators configured in `ctx`.
    pub fn new(config: BuildConfiguration, ctx: &GlobalContext) -> Self {
        let tools = ctx.config();
        ArcBuilder {
            workspace_root: ctx.workspace_root(),
            destination: ctx.resolve_path(config.destination()),
            theme_file: config.theme_file().map(|p| ctx.resolve_path(p)),
            debug_log: ctx.debug_log_path(),
            start_dir: ctx.cwd().to_path_buf(),
            logger: Arc::new(TracingLogger),
            installer: Box::new(tools.installer()),
            bundler: Box::new(tools.bundler()),
            wrapper: Box::new(tools.wrapper_generator()),
            stage: Stage::Init,
            config,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn BuildLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_installer(mut self, installer: Box<dyn DependencyInstaller>) -> Self {
        self.installer = installer;
        self
    }

    pub fn with_bundler(mut self, bundler: Box<dyn Bundler>) -> Self {
        self.bundler = bundler;
        self
    }

    pub fn with_wrapper_generator(mut self, wrapper: Box<dyn WrapperGenerator>) -> Self {
        self.wrapper = wrapper;
        self
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Run every stage in order.
    pub fn build(&mut self) -> Result<BuildReport, BuildError> {
        if self.stage != Stage::Init {
            return Err(BuildError::stage(
                self.stage,
                anyhow::anyhow!("a build can only run once"),
            ));
        }

        let mut report = BuildReport::new(self.destination.clone());
        match self.run(&mut report) {
            Ok(()) => {
                self.logger.info(&format!(
                    "Build complete. Output is in {}",
                    self.destination.display()
                ));
                Ok(report)
            }
            Err(err) => {
                self.stage = Stage::Failed;
                let chain = err.chain();
                self.logger.error(&chain[0]);
                for cause in &chain[1..] {
                    self.logger.error(&format!("  caused by: {}", cause));
                }
                Err(err)
            }
        }
    }

    fn run(&mut self, report: &mut BuildReport) -> Result<(), BuildError> {
        self.advance();
        let workspace = self.prepare_build(report)?;
        report.stages.push(Stage::PrepareBuild);

        self.advance();
        self.perform_build(&workspace, report)?;
        report.stages.push(Stage::PerformBuild);

        self.advance();
        self.post_build(&workspace)
            .map_err(|e| BuildError::stage(Stage::PostBuild, e))?;
        report.stages.push(Stage::PostBuild);

        self.advance();
        self.cleanup();
        report.stages.push(Stage::Cleanup);

        self.advance();
        Ok(())
    }

    fn advance(&mut self) {
        self.stage = self.stage.next();
        tracing::debug!("entering stage {}", self.stage);
    }

    fn prepare_build(&self, report: &mut BuildReport) -> Result<BuildWorkspace, BuildError> {
        let stage = Stage::PrepareBuild;
        self.logger.info("Preparing build...");

        let workspace = BuildWorkspace::create(&self.workspace_root)?;

        let manifest =
            DependencyManifest::new(self.config.component_refs(), self.config.extra_refs())?;
        manifest
            .save(&workspace.dependency_manifest_path())
            .map_err(|e| BuildError::stage(stage, e))?;
        report.dependencies = manifest.dependencies.len();

        let opts = InstallOptions {
            verbose: self.config.verbose(),
        };
        self.installer
            .install(workspace.root(), self.logger.as_ref(), &opts)
            .context("failed to install dependencies")
            .map_err(|e| BuildError::stage(stage, e))?;

        if let Some(ref theme) = self.theme_file {
            copy_theme(theme, &workspace).map_err(|e| BuildError::stage(stage, e))?;
        }

        let imports = build_imports(self.config.component_refs(), self.config.extra_refs())?;
        write_string(&workspace.import_manifest_path(), &render_imports(&imports))
            .map_err(|e| BuildError::stage(stage, e))?;
        report.imports = imports.len();

        Ok(workspace)
    }

    fn perform_build(
        &self,
        workspace: &BuildWorkspace,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        let stage = Stage::PerformBuild;

        if self.config.bundle() {
            self.logger.info("Bundling sources...");
            let summary = SourceTransformer::new(workspace, self.bundler.as_ref())
                .run()
                .map_err(|e| BuildError::stage(stage, e))?;
            self.logger.log(&format!(
                "bundled {} source and {} dependency documents",
                summary.source_documents, summary.dependency_documents
            ));
            report.bundled = true;
        } else {
            tracing::debug!("bundling not requested, keeping development sources");
        }

        if self.config.generate_wrapper() {
            self.logger.info("Generating wrappers...");
            let mut request =
                WrapperRequest::new(workspace.import_manifest_path(), workspace.root());
            if let Some(components) = self.config.wrapper_components() {
                request = request.with_components(components.to_vec());
            }
            if self.config.bundle_wrapper() {
                request = request.with_bundle(WRAPPER_BUNDLE_NAME);
            }

            self.wrapper
                .generate(&request, self.logger.as_ref())
                .context("failed to generate wrappers")
                .map_err(|e| BuildError::stage(stage, e))?;
            report.wrapper_generated = true;
        }

        Ok(())
    }

    fn post_build(&self, workspace: &BuildWorkspace) -> anyhow::Result<()> {
        let destination = &self.destination;
        check_destination(destination, workspace.root(), &self.start_dir)?;

        self.logger
            .info(&format!("Copying output to {}...", destination.display()));
        remove_path_if_exists(destination)?;
        move_dir(workspace.root(), destination)?;

        for entry in build_only_entries() {
            remove_path_if_exists(&destination.join(entry))?;
        }
        if let Some(name) = self.theme_file.as_deref().and_then(Path::file_name) {
            remove_path_if_exists(&destination.join(name))?;
        }

        Ok(())
    }

    fn cleanup(&self) {
        if let Err(e) = remove_path_if_exists(&self.debug_log) {
            self.logger.warn(&format!("Could not remove debug log: {:#}", e));
        }
    }
}

/// Copy the theme file into the workspace, keeping its file name.
fn copy_theme(theme: &Path, workspace: &BuildWorkspace) -> anyhow::Result<()> {
    let Some(name) = theme.file_name() else {
        bail!("theme file `{}` has no file name", theme.display());
    };
    let target = workspace.root().join(name);
    fs::copy(theme, &target).with_context(|| {
        format!(
            "failed to copy theme file {} to {}",
            theme.display(),
            target.display()
        )
    })?;
    Ok(())
}

/// The destination is replaced wholesale, so it must not contain the
/// invocation directory or the workspace, nor live inside the workspace.
fn check_destination(destination: &Path, workspace: &Path, start_dir: &Path) -> anyhow::Result<()> {
    let destination = normalize_path(destination);
    let workspace = normalize_path(workspace);
    let start_dir = normalize_path(start_dir);

    if is_inside(&start_dir, &destination) {
        bail!(
            "destination `{}` contains the working directory and cannot be replaced",
            destination.display()
        );
    }
    if is_inside(&destination, &workspace) {
        bail!(
            "destination `{}` is inside the build workspace",
            destination.display()
        );
    }
    if is_inside(&workspace, &destination) {
        bail!(
            "destination `{}` contains the build workspace `{}`",
            destination.display(),
            workspace.display()
        );
    }
    Ok(())
}

/// Build with the collaborators configured in `ctx` and the logger declared
/// in the options.
pub fn build(config: BuildConfiguration, ctx: &GlobalContext) -> Result<BuildReport, BuildError> {
    let logger = logger_from_spec(config.logger()).map_err(|e| BuildError::stage(Stage::Init, e))?;
    ArcBuilder::new(config, ctx).with_logger(logger).build()
}
