//! Shared types passed between pipeline stages.
//!
//! A source file becomes a [`Document`] at load time, a [`RenderedDocument`]
//! once its metadata block is parsed and its body rendered, and finally one
//! or more [`Page`]s during generation.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Which content directory a document was discovered in.
///
/// Dispatch on document type is always an explicit `match` on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Article,
    About,
    Index,
    Static,
}

impl DocumentKind {
    /// Name of the directory under the content root holding this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            DocumentKind::Article => "article",
            DocumentKind::About => "about",
            DocumentKind::Index => "index",
            DocumentKind::Static => "static",
        }
    }

    /// Whether documents of this kind are markdown and go through processing.
    pub fn is_markdown(self) -> bool {
        !matches!(self, DocumentKind::Static)
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A source file. Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub kind: DocumentKind,
    /// Absolute (or content-root-joined) path on disk.
    pub source_path: PathBuf,
    /// Path relative to the kind directory, e.g. `a/x.md` for `article/a/x.md`.
    pub relative_path: PathBuf,
    /// Raw text. Static assets are copied byte-for-byte and leave this empty.
    pub text: String,
}

impl Document {
    /// Relative path with `/` separators regardless of platform.
    ///
    /// This is the stable identity of an article across builds.
    pub fn identity(&self) -> String {
        path_to_slash(&self.relative_path)
    }
}

/// Lowercased metadata key → every value seen for it, in order.
pub type Metadata = BTreeMap<String, Vec<String>>;

/// The required fields every markdown document must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    pub title: String,
    pub date: NaiveDate,
}

/// A document with its metadata extracted and its body rendered to HTML.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub document: Document,
    pub metadata: Metadata,
    pub meta: DocumentMeta,
    pub html: String,
}

/// Identifier handed out to each generated page.
///
/// Used as the key of the page → document side table built during
/// generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub usize);

/// A generated HTML artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: PageId,
    /// Path relative to the output root, `/`-separated. Unique within a build.
    pub output_path: String,
    pub content: String,
}

impl Page {
    pub fn url(&self) -> String {
        format!("/{}", self.output_path)
    }
}

/// Join path components with `/`.
pub fn path_to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
