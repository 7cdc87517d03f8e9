//! Core data structures.
//!
//! This module contains the foundational types of a build:
//! - Dependency references and their naming rules
//! - Validated build options
//! - The staging workspace

pub mod dependency;
pub mod options;
pub mod workspace;

pub use dependency::{DependencyReference, DependencyScope, MissingNameError};
pub use options::{BuildConfiguration, ConfigurationError, ProjectOptions};
pub use workspace::BuildWorkspace;
