//! Import manifest (`import.html`) generation.

use std::fmt;

use crate::core::dependency::{short_name, MissingNameError};
use crate::core::workspace::DEPENDENCIES_DIR_NAME;

/// Component model runtime, always imported first.
pub const RUNTIME_COMPONENT: &str = "polymer";

/// Extension of a component's entry document.
const COMPONENT_EXTENSION: &str = "html";

/// A single HTML import of an installed component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    href: String,
}

impl ImportStatement {
    /// Import the entry document of an installed component.
    pub fn for_component(name: &str) -> Self {
        ImportStatement {
            href: format!(
                "{}/{}/{}.{}",
                DEPENDENCIES_DIR_NAME, name, name, COMPONENT_EXTENSION
            ),
        }
    }

    /// Path of the imported document, relative to the workspace root.
    pub fn href(&self) -> &str {
        &self.href
    }
}

impl fmt::Display for ImportStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<link rel=\"import\" href=\"{}\">", self.href)
    }
}

/// One import per declared reference, in declaration order, after the runtime.
///
/// Unlike the dependency manifest nothing is de-duplicated here.
pub fn build_imports(
    default_refs: &[String],
    extra_refs: &[String],
) -> Result<Vec<ImportStatement>, MissingNameError> {
    let mut imports = Vec::with_capacity(1 + default_refs.len() + extra_refs.len());
    imports.push(ImportStatement::for_component(RUNTIME_COMPONENT));

    for raw in default_refs.iter().chain(extra_refs) {
        imports.push(ImportStatement::for_component(short_name(raw)?));
    }

    Ok(imports)
}

/// Serialize imports one per line, newline-terminated.
pub fn render_imports(imports: &[ImportStatement]) -> String {
    imports.iter().map(|import| format!("{}\n", import)).collect()
}
