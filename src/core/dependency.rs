//! Declared component dependencies.
//!
//! A dependency is declared as a plain string. It can be a bare component
//! name (`paper-fab`), an `owner/name` pair, a full git URL, and any of
//! these can carry a `#<version or ref>` suffix.

use std::fmt;

use thiserror::Error;

/// Organization prefix applied to bare names in the primary component list.
pub const DEFAULT_SCOPE: &str = "advanced-rest-client";

/// Separates the owner/URL part from the component name.
const PATH_SEPARATOR: char = '/';

/// Starts a version or git ref suffix.
const VERSION_MARKER: char = '#';

/// A dependency reference was empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency name is not defined")]
pub struct MissingNameError;

/// Which declared list a reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyScope {
    /// The primary list; bare names get [`DEFAULT_SCOPE`] prepended.
    Default,
    /// Components from arbitrary owners; used verbatim.
    Extra,
}

/// A single parsed dependency entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReference {
    raw_name: String,
    short_name: String,
    resolved_name: String,
    scope: DependencyScope,
}

impl DependencyReference {
    /// Parse a declared reference from the given list.
    pub fn parse(raw: &str, scope: DependencyScope) -> Result<Self, MissingNameError> {
        let short_name = short_name(raw)?.to_string();

        let resolved_name = match scope {
            DependencyScope::Default if !raw.contains(PATH_SEPARATOR) => {
                format!("{}{}{}", DEFAULT_SCOPE, PATH_SEPARATOR, raw)
            }
            _ => raw.to_string(),
        };

        Ok(DependencyReference {
            raw_name: raw.to_string(),
            short_name,
            resolved_name,
            scope,
        })
    }

    /// Parse every entry of a declared list, stopping at the first empty one.
    pub fn parse_all(
        raws: &[String],
        scope: DependencyScope,
    ) -> Result<Vec<Self>, MissingNameError> {
        raws.iter().map(|raw| Self::parse(raw, scope)).collect()
    }

    /// The string exactly as declared.
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// Display name with owner and version stripped.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Reference handed to the dependency installer.
    pub fn resolved_name(&self) -> &str {
        &self.resolved_name
    }

    pub fn scope(&self) -> DependencyScope {
        self.scope
    }
}

impl fmt::Display for DependencyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.short_name, self.resolved_name)
    }
}

/// Derive the short name of a reference.
///
/// Everything up to the last `/` is dropped, then everything from the first
/// `#` on. `https://github.com/PolymerElements/paper-input#^2.0.0` becomes
/// `paper-input`.
pub fn short_name(raw: &str) -> Result<&str, MissingNameError> {
    if raw.is_empty() {
        return Err(MissingNameError);
    }

    let name = match raw.rfind(PATH_SEPARATOR) {
        Some(pos) => &raw[pos + 1..],
        None => raw,
    };

    let name = match name.find(VERSION_MARKER) {
        Some(pos) => &name[..pos],
        None => name,
    };

    Ok(name)
}
