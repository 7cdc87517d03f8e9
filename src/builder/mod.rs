//! Bundle building.
//!
//! This module holds the document transform used by the bundle stage and the
//! external collaborators a build drives: installer, bundler and wrapper
//! generator.

pub mod bundler;
pub mod document;
pub mod installer;
pub mod splitter;
pub mod transform;
pub mod wrapper;

pub use bundler::{Bundler, CommandBundler};
pub use document::{DocumentKind, DocumentStream, SourceDocument};
pub use installer::{BowerInstaller, DependencyInstaller, InstallOptions};
pub use splitter::{fixup, merge, rejoin, split, SplitError, SplitStream};
pub use transform::{SourceTransformer, TransformSummary};
pub use wrapper::{CommandWrapperGenerator, WrapperGenerator, WrapperRequest};
