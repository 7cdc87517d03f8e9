//! High-level operations.
//!
//! This module contains the build pipeline and the manifests it writes.

pub mod arc_build;
pub mod error;
pub mod imports;
pub mod manifest;

pub use arc_build::{build, ArcBuilder, BuildReport, Stage};
pub use error::BuildError;
pub use imports::{build_imports, render_imports, ImportStatement};
pub use manifest::{build_manifest, DependencyManifest};
