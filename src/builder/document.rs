//! In-memory source documents.
//!
//! The bundle stage works on streams of documents rather than on files so
//! that every transformation step can be tested without touching the disk.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use crate::util::fs::{relative_path, write_string};

/// What a document contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// HTML, possibly with inline scripts.
    Markup,
    /// JavaScript.
    Script,
    /// CSS.
    Style,
}

impl DocumentKind {
    /// Kind of a document by file extension, `None` for files the bundle
    /// stage does not look at.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(DocumentKind::Markup),
            "js" | "mjs" => Some(DocumentKind::Script),
            "css" => Some(DocumentKind::Style),
            _ => None,
        }
    }
}

/// A file record: path relative to the stream root, text and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub contents: String,
    pub kind: DocumentKind,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>, kind: DocumentKind) -> Self {
        SourceDocument {
            path: path.into(),
            contents: contents.into(),
            kind,
        }
    }

    /// Create a document, deriving the kind from the path's extension.
    pub fn from_path(path: impl Into<PathBuf>, contents: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let kind = DocumentKind::from_path(&path)?;
        Some(SourceDocument::new(path, contents, kind))
    }
}

/// An ordered sequence of documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStream {
    documents: Vec<SourceDocument>,
}

impl DocumentStream {
    pub fn new(documents: Vec<SourceDocument>) -> Self {
        DocumentStream { documents }
    }

    /// Load every recognized document under `dir`.
    ///
    /// Paths are stored relative to `root`. Directories whose path relative
    /// to `root` appears in `exclude` are skipped along with their contents,
    /// and so are excluded files. Documents are ordered by path.
    pub fn load(root: &Path, dir: &Path, exclude: &[PathBuf]) -> Result<Self> {
        let mut documents = Vec::new();

        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let rel = relative_path(root, entry.path());
                !exclude.iter().any(|excluded| rel == *excluded)
            });

        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(kind) = DocumentKind::from_path(entry.path()) else {
                continue;
            };

            let bytes = fs::read(entry.path())
                .with_context(|| format!("failed to read {}", entry.path().display()))?;
            let contents = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("{} is not valid UTF-8", entry.path().display());
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };

            documents.push(SourceDocument::new(
                relative_path(root, entry.path()),
                contents,
                kind,
            ));
        }

        Ok(DocumentStream { documents })
    }

    /// Write every document under `root`.
    ///
    /// Paths must be relative and must not leave `root`.
    pub fn write_to(&self, root: &Path) -> Result<()> {
        for doc in &self.documents {
            if !is_contained(&doc.path) {
                bail!(
                    "refusing to write `{}` outside of {}",
                    doc.path.display(),
                    root.display()
                );
            }
            write_string(&root.join(&doc.path), &doc.contents)?;
        }
        Ok(())
    }

    pub fn documents(&self) -> &[SourceDocument] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<SourceDocument> {
        self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceDocument> {
        self.documents.iter()
    }
}

impl FromIterator<SourceDocument> for DocumentStream {
    fn from_iter<I: IntoIterator<Item = SourceDocument>>(iter: I) -> Self {
        DocumentStream {
            documents: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DocumentStream {
    type Item = SourceDocument;
    type IntoIter = std::vec::IntoIter<SourceDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

/// `true` for relative paths made only of normal components.
fn is_contained(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
