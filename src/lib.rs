//! arc-builder - builds deployable bundles of ARC web components
//!
//! This crate provides the library side of the builder: option validation,
//! manifest generation, the document transform of the bundle stage, and the
//! staged build pipeline.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides recording mocks for the logger and for every
/// external collaborator of a build.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildConfiguration, BuildWorkspace, DependencyReference, ProjectOptions};
pub use ops::{build, ArcBuilder, BuildError, BuildReport, Stage};
pub use util::context::GlobalContext;
