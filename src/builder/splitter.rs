//! Split, fix up, rejoin and merge document streams.
//!
//! Inline scripts of HTML documents are pulled out into their own `Script`
//! documents so script-only rewrites never see markup. A [`JoinPlan`] per
//! split document records where each script body belongs, which makes the
//! split lossless: `rejoin(split(s)) == s` for any stream.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::builder::document::{DocumentKind, DocumentStream, SourceDocument};

/// Matches a whole `<script>` element; group 1 is the attributes, group 2 the body.
static SCRIPT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script(\s[^>]*)?>(.*?)</script\s*>").unwrap());

/// An HTML comment. An unterminated comment runs to the end of the document.
static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)").unwrap());

static SRC_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)src\s*=").unwrap());

static TYPE_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:^|\s)type\s*=\s*["']?([^"'\s>]+)"#).unwrap());

/// Script types that hold JavaScript.
const SCRIPT_TYPES: &[&str] = &[
    "text/javascript",
    "application/javascript",
    "text/ecmascript",
    "application/ecmascript",
    "module",
];

/// Sequence the bundler mangles inside scripts.
const COMMENT_CLOSE: &str = "-->";

/// Replacement that survives bundling and is still valid JavaScript.
const COMMENT_CLOSE_SPACED: &str = "-- >";

/// Error while splitting or rejoining a stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("extracted script `{}` collides with an existing document", path.display())]
    PathCollision { path: PathBuf },

    #[error("document `{}` is missing its script fragment `{}`", parent.display(), fragment.display())]
    MissingFragment { parent: PathBuf, fragment: PathBuf },

    #[error("split document `{}` is missing from the stream", parent.display())]
    MissingParent { parent: PathBuf },

    #[error("script fragment offset {offset} is invalid for `{}`", parent.display())]
    InvalidOffset { parent: PathBuf, offset: usize },
}

/// Where the scripts of one split document go back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    /// The markup document the scripts were taken from.
    pub parent: PathBuf,
    /// Byte offset in the hollowed markup and path of the script to insert there.
    pub slots: Vec<(usize, PathBuf)>,
}

/// A stream whose markup documents have been split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitStream {
    documents: Vec<SourceDocument>,
    plans: Vec<JoinPlan>,
}

impl SplitStream {
    pub fn documents(&self) -> &[SourceDocument] {
        &self.documents
    }

    pub fn plans(&self) -> &[JoinPlan] {
        &self.plans
    }
}

/// Extract inline scripts from every markup document.
///
/// Each extracted script follows its parent in the output stream and is named
/// `<parent>_script_<n>.js`.
pub fn split(stream: DocumentStream) -> Result<SplitStream, SplitError> {
    let existing: HashSet<PathBuf> = stream.iter().map(|doc| doc.path.clone()).collect();
    let mut documents = Vec::with_capacity(stream.len());
    let mut plans = Vec::new();

    for doc in stream {
        if doc.kind != DocumentKind::Markup {
            documents.push(doc);
            continue;
        }

        let (markup, scripts) = extract_scripts(&doc.path, &doc.contents);
        if scripts.is_empty() {
            documents.push(doc);
            continue;
        }

        let mut slots = Vec::with_capacity(scripts.len());
        let mut fragments = Vec::with_capacity(scripts.len());
        for (offset, script) in scripts {
            if existing.contains(&script.path) {
                return Err(SplitError::PathCollision { path: script.path });
            }
            slots.push((offset, script.path.clone()));
            fragments.push(script);
        }

        plans.push(JoinPlan {
            parent: doc.path.clone(),
            slots,
        });
        documents.push(SourceDocument::new(doc.path, markup, DocumentKind::Markup));
        documents.extend(fragments);
    }

    Ok(SplitStream { documents, plans })
}

/// Returns the markup with inline script bodies removed, and each removed
/// body as a script document with its insertion offset.
fn extract_scripts(parent: &Path, html: &str) -> (String, Vec<(usize, SourceDocument)>) {
    let mut markup = String::with_capacity(html.len());
    let mut scripts = Vec::new();
    let mut cursor = 0;
    let mut search = 0;

    while let Some(caps) = SCRIPT_ELEMENT.captures_at(html, search) {
        let Some(element) = caps.get(0) else {
            break;
        };
        // Comments in markup ahead of the element are skipped whole, so a
        // script tag inside one is never taken as a script.
        if let Some(comment) = HTML_COMMENT.find_at(html, search) {
            if comment.start() < element.start() {
                search = comment.end();
                continue;
            }
        }
        search = element.end();

        let Some(body) = caps.get(2) else {
            continue;
        };
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        if !is_inline_script(attrs) {
            continue;
        }

        markup.push_str(&html[cursor..body.start()]);
        let path = fragment_path(parent, scripts.len());
        scripts.push((
            markup.len(),
            SourceDocument::new(path, body.as_str(), DocumentKind::Script),
        ));
        cursor = body.end();
    }

    markup.push_str(&html[cursor..]);
    (markup, scripts)
}

fn is_inline_script(attrs: &str) -> bool {
    if SRC_ATTRIBUTE.is_match(attrs) {
        return false;
    }
    match TYPE_ATTRIBUTE.captures(attrs).and_then(|caps| caps.get(1)) {
        Some(ty) => SCRIPT_TYPES
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ty.as_str())),
        None => true,
    }
}

fn fragment_path(parent: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(parent.as_os_str());
    name.push(format!("_script_{}.js", index));
    PathBuf::from(name)
}

/// Rewrite script text so the bundler cannot corrupt it.
pub fn fix_script(source: &str) -> String {
    source.replace(COMMENT_CLOSE, COMMENT_CLOSE_SPACED)
}

/// Apply [`fix_script`] to every script document. Markup and styles pass through.
pub fn fixup(mut split: SplitStream) -> SplitStream {
    for doc in &mut split.documents {
        if doc.kind == DocumentKind::Script && doc.contents.contains(COMMENT_CLOSE) {
            doc.contents = fix_script(&doc.contents);
        }
    }
    split
}

/// Put extracted scripts back into their documents.
///
/// Document order is the order of the split stream with fragments removed.
pub fn rejoin(split: SplitStream) -> Result<DocumentStream, SplitError> {
    let SplitStream { documents, plans } = split;

    let fragment_paths: HashSet<&PathBuf> = plans
        .iter()
        .flat_map(|plan| plan.slots.iter().map(|(_, path)| path))
        .collect();

    let mut fragments: HashMap<PathBuf, String> = HashMap::new();
    let mut rest = Vec::with_capacity(documents.len());
    for doc in documents {
        if fragment_paths.contains(&doc.path) {
            fragments.insert(doc.path, doc.contents);
        } else {
            rest.push(doc);
        }
    }

    let mut pending: HashMap<&Path, &JoinPlan> = plans
        .iter()
        .map(|plan| (plan.parent.as_path(), plan))
        .collect();

    let mut joined = Vec::with_capacity(rest.len());
    for doc in rest {
        match pending.remove(doc.path.as_path()) {
            Some(plan) => {
                let contents = join_document(&doc.contents, plan, &mut fragments)?;
                joined.push(SourceDocument::new(doc.path, contents, doc.kind));
            }
            None => joined.push(doc),
        }
    }

    if let Some(plan) = plans.iter().find(|plan| pending.contains_key(plan.parent.as_path())) {
        return Err(SplitError::MissingParent {
            parent: plan.parent.clone(),
        });
    }

    Ok(DocumentStream::new(joined))
}

fn join_document(
    markup: &str,
    plan: &JoinPlan,
    fragments: &mut HashMap<PathBuf, String>,
) -> Result<String, SplitError> {
    let mut out = String::with_capacity(markup.len());
    let mut cursor = 0;

    for (offset, path) in &plan.slots {
        let offset = *offset;
        if offset < cursor || offset > markup.len() || !markup.is_char_boundary(offset) {
            return Err(SplitError::InvalidOffset {
                parent: plan.parent.clone(),
                offset,
            });
        }
        let script = fragments
            .remove(path)
            .ok_or_else(|| SplitError::MissingFragment {
                parent: plan.parent.clone(),
                fragment: path.clone(),
            })?;

        out.push_str(&markup[cursor..offset]);
        out.push_str(&script);
        cursor = offset;
    }

    out.push_str(&markup[cursor..]);
    Ok(out)
}

/// Split, fix up and rejoin a single stream.
pub fn prepare(stream: DocumentStream) -> Result<DocumentStream, SplitError> {
    rejoin(fixup(split(stream)?))
}

/// Concatenate two streams, `first` before `second`.
pub fn merge(first: DocumentStream, second: DocumentStream) -> DocumentStream {
    first.into_iter().chain(second).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup(path: &str, contents: &str) -> SourceDocument {
        SourceDocument::new(path, contents, DocumentKind::Markup)
    }

    fn script(path: &str, contents: &str) -> SourceDocument {
        SourceDocument::new(path, contents, DocumentKind::Script)
    }

    const ELEMENT: &str = "<dom-module id=\"x-a\">\n\
        <template><!-- a comment --></template>\n\
        <script>\n  // legacy -->\n  Polymer({is: 'x-a'});\n</script>\n\
        <script src=\"external.js\"></script>\n\
        <script type=\"text/template\"><b>--></b></script>\n\
        <script type=\"module\">if (a-->0) {}</script>\n\
        </dom-module>\n";

    #[test]
    fn test_fix_script() {
        assert_eq!(fix_script("a --> b"), "a -- > b");
        assert_eq!(fix_script("while (i-->0) {} // -->"), "while (i-- >0) {} // -- >");
        assert_eq!(fix_script("nothing here"), "nothing here");
    }

    #[test]
    fn test_split_extracts_inline_scripts_only() {
        let split = split(DocumentStream::new(vec![markup("x-a.html", ELEMENT)])).unwrap();

        let docs = split.documents();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].path, PathBuf::from("x-a.html"));
        assert_eq!(docs[1].path, PathBuf::from("x-a.html_script_0.js"));
        assert_eq!(docs[1].kind, DocumentKind::Script);
        assert!(docs[1].contents.contains("Polymer({is: 'x-a'})"));
        assert_eq!(docs[2].path, PathBuf::from("x-a.html_script_1.js"));
        assert_eq!(docs[2].contents, "if (a-->0) {}");

        // Markup keeps the external and template scripts untouched.
        assert!(docs[0].contents.contains("<script src=\"external.js\"></script>"));
        assert!(docs[0].contents.contains("<b>--></b>"));
        assert!(!docs[0].contents.contains("Polymer("));
        assert_eq!(split.plans().len(), 1);
        assert_eq!(split.plans()[0].slots.len(), 2);
    }

    #[test]
    fn test_split_then_rejoin_is_lossless() {
        let stream = DocumentStream::new(vec![
            markup("x-a.html", ELEMENT),
            script("app.js", "var x = 1;"),
            markup("plain.html", "<p>no scripts</p>"),
            markup("ünï.html", "<p>ß</p><script>var ü = 'é';</script><p>€</p>"),
        ]);

        let rejoined = rejoin(split(stream.clone()).unwrap()).unwrap();
        assert_eq!(rejoined, stream);
    }

    #[test]
    fn test_fixup_touches_scripts_only() {
        let stream = DocumentStream::new(vec![
            markup("x-a.html", ELEMENT),
            script("standalone.js", "i-->0"),
            SourceDocument::new("theme.css", "/* --> */", DocumentKind::Style),
        ]);

        let out = prepare(stream).unwrap();
        let docs = out.documents();

        assert_eq!(docs.len(), 3);
        assert!(docs[0].contents.contains("// legacy -- >"));
        assert!(docs[0].contents.contains("if (a-- >0) {}"));
        assert!(docs[0].contents.contains("<template><!-- a comment --></template>"));
        assert!(docs[0].contents.contains("<b>--></b>"));
        assert_eq!(docs[1].contents, "i-- >0");
        assert_eq!(docs[2].contents, "/* --> */");
    }

    #[test]
    fn test_commented_out_script_stays_markup() {
        let html = "<!-- <script> --><p>a</p><script>x()</script>";
        let split = split(DocumentStream::new(vec![markup("a.html", html)])).unwrap();

        assert_eq!(split.documents().len(), 2);
        assert_eq!(split.documents()[1].contents, "x()");

        let out = prepare(DocumentStream::new(vec![markup("a.html", html)])).unwrap();
        assert_eq!(out.documents()[0].contents, html);

        let unterminated = "<p>a</p><!-- <script>x()</script>";
        let split_unterminated =
            super::split(DocumentStream::new(vec![markup("b.html", unterminated)])).unwrap();
        assert_eq!(split_unterminated.documents().len(), 1);

        // A comment opener inside a script body does not hide later scripts.
        let in_script = "<script>if (a<!--b) {}</script><script>i-->0</script>";
        let out = prepare(DocumentStream::new(vec![markup("c.html", in_script)])).unwrap();
        assert_eq!(
            out.documents()[0].contents,
            "<script>if (a<!--b) {}</script><script>i-- >0</script>"
        );
    }

    #[test]
    fn test_split_collision() {
        let stream = DocumentStream::new(vec![
            markup("a.html", "<script>1</script>"),
            script("a.html_script_0.js", "2"),
        ]);

        assert_eq!(
            split(stream).unwrap_err(),
            SplitError::PathCollision {
                path: PathBuf::from("a.html_script_0.js")
            }
        );
    }

    #[test]
    fn test_rejoin_missing_fragment() {
        let mut split = split(DocumentStream::new(vec![markup("a.html", "<script>1</script>")])).unwrap();
        split.documents.retain(|doc| doc.kind != DocumentKind::Script);

        assert!(matches!(
            rejoin(split),
            Err(SplitError::MissingFragment { .. })
        ));
    }

    #[test]
    fn test_rejoin_missing_parent() {
        let mut split = split(DocumentStream::new(vec![markup("a.html", "<script>1</script>")])).unwrap();
        split.documents.retain(|doc| doc.kind != DocumentKind::Markup);

        assert!(matches!(rejoin(split), Err(SplitError::MissingParent { .. })));
    }

    #[test]
    fn test_rejoin_invalid_offset() {
        let mut split = split(DocumentStream::new(vec![markup("a.html", "<script>1</script>")])).unwrap();
        split.documents[0].contents.clear();

        assert!(matches!(rejoin(split), Err(SplitError::InvalidOffset { .. })));
    }

    #[test]
    fn test_merge_keeps_order() {
        let primary = DocumentStream::new(vec![markup("import.html", ""), script("b.js", "")]);
        let deps = DocumentStream::new(vec![markup("bower_components/a/a.html", "")]);

        let merged = merge(primary, deps);
        let paths: Vec<_> = merged.iter().map(|d| d.path.to_string_lossy().into_owned()).collect();
        assert_eq!(paths, ["import.html", "b.js", "bower_components/a/a.html"]);
    }
}
