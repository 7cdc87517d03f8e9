//! Build error types and diagnostics.

use std::path::Path;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::dependency::MissingNameError;
use crate::core::options::ConfigurationError;
use crate::core::workspace::WorkspaceError;
use crate::ops::arc_build::Stage;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Terminal failure of a build.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BuildError {
    #[error(transparent)]
    #[diagnostic(code(arc_builder::options::invalid))]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    #[diagnostic(code(arc_builder::manifest::missing_name))]
    MissingName(#[from] MissingNameError),

    #[error("{stage} stage failed")]
    #[diagnostic(code(arc_builder::build::stage_failed))]
    StageFailed {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(arc_builder::workspace::io))]
    Filesystem(#[from] WorkspaceError),
}

impl BuildError {
    pub fn stage(stage: Stage, source: anyhow::Error) -> Self {
        BuildError::StageFailed { stage, source }
    }

    /// Messages of this error and every error that caused it, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            messages.push(err.to_string());
            source = err.source();
        }
        messages
    }

    /// Convert to a user-friendly diagnostic. `debug_log` is the log a
    /// failed build leaves behind.
    pub fn to_diagnostic(&self, debug_log: &Path) -> Diagnostic {
        match self {
            BuildError::Configuration(err) => {
                let mut diag = Diagnostic::error("invalid build options");
                for message in &err.errors {
                    diag = diag.with_context(message.clone());
                }
                diag.with_suggestion(suggestions::CHECK_OPTIONS)
            }

            BuildError::MissingName(err) => {
                Diagnostic::error(err.to_string()).with_suggestion(suggestions::EMPTY_REFERENCE)
            }

            BuildError::StageFailed { stage, source } => {
                let mut diag = Diagnostic::error(format!("{} stage failed", stage));
                for cause in source.chain() {
                    diag = diag.with_context(cause.to_string());
                }
                diag.with_suggestion(format!("Inspect the debug log `{}`", debug_log.display()))
                    .with_suggestion(suggestions::BUILD_FAILED)
            }

            BuildError::Filesystem(err) => {
                let mut diag = Diagnostic::error(err.to_string());
                if let Some(cause) = std::error::Error::source(err) {
                    diag = diag.with_context(cause.to_string());
                }
                diag
            }
        }
    }
}
