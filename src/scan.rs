//! Filesystem scanning.
//!
//! Stage 1 of the build pipeline. Walks the content root and reads every
//! source document into memory, grouped by [`DocumentKind`].
//!
//! ## Directory Structure
//!
//! ```text
//! content/                     # Content root
//! ├── config.toml              # Site configuration (optional)
//! ├── article/                 # Articles, any depth
//! │   ├── rust/                # Directories become archive topics
//! │   │   ├── ownership.md
//! │   │   └── async/
//! │   │       └── pinning.md
//! │   └── ops/
//! │       └── deploy.md
//! ├── about/
//! │   └── about.md             # Exactly one document
//! ├── index/
//! │   └── index.md             # Exactly one document
//! └── static/                  # Copied verbatim to <output>/static/
//!     └── logo.svg
//! ```
//!
//! ## Rules
//!
//! - Only files with a markdown extension are documents in `article/`,
//!   `about/` and `index/`; anything else there is ignored.
//! - Every file under `static/` is an asset, whatever its extension.
//! - Hidden entries (leading `.`) are skipped, directories included.
//! - A missing kind directory simply yields no documents.
//! - Documents are ordered by relative path. This order is the allocation
//!   order for output paths, so it must not depend on directory iteration.

use crate::config::{self, SiteConfig};
use crate::types::{Document, DocumentKind};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot walk content tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Extensions recognized as markdown, lowercase, without the dot.
pub const MARKDOWN_EXTENSIONS: &[&str] = &[
    "markdown", "mdown", "mkdn", "md", "mkd", "mdwn", "mdtxt", "mdtext",
];

/// Everything the later stages need from the content root.
#[derive(Debug)]
pub struct SourceSet {
    pub root: PathBuf,
    pub config: SiteConfig,
    pub articles: Vec<Document>,
    pub about: Vec<Document>,
    pub index: Vec<Document>,
    pub statics: Vec<Document>,
}

impl SourceSet {
    pub fn documents(&self, kind: DocumentKind) -> &[Document] {
        match kind {
            DocumentKind::Article => &self.articles,
            DocumentKind::About => &self.about,
            DocumentKind::Index => &self.index,
            DocumentKind::Static => &self.statics,
        }
    }

    /// Documents that go through metadata parsing and rendering, articles first.
    pub fn markdown_documents(&self) -> impl Iterator<Item = &Document> {
        self.articles
            .iter()
            .chain(self.about.iter())
            .chain(self.index.iter())
    }
}

/// Load config and discover every document under `root`.
pub fn scan(root: &Path) -> Result<SourceSet, ScanError> {
    let config = config::load_config(root)?;

    let sources = SourceSet {
        root: root.to_path_buf(),
        config,
        articles: discover(root, DocumentKind::Article)?,
        about: discover(root, DocumentKind::About)?,
        index: discover(root, DocumentKind::Index)?,
        statics: discover(root, DocumentKind::Static)?,
    };

    tracing::debug!(
        articles = sources.articles.len(),
        about = sources.about.len(),
        index = sources.index.len(),
        statics = sources.statics.len(),
        "Scan completed"
    );
    Ok(sources)
}

/// All documents of one kind, sorted by relative path.
pub fn discover(root: &Path, kind: DocumentKind) -> Result<Vec<Document>, ScanError> {
    let dir = root.join(kind.dir_name());
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "No {kind} directory");
        return Ok(Vec::new());
    }

    let walker = WalkDir::new(&dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    let mut documents = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let source_path = entry.into_path();
        if kind.is_markdown() && !is_markdown(&source_path) {
            tracing::debug!(path = %source_path.display(), "Skipping non-markdown file");
            continue;
        }

        let relative_path = source_path
            .strip_prefix(&dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| source_path.clone());
        let text = if kind.is_markdown() {
            fs::read_to_string(&source_path).map_err(|source| ScanError::Read {
                path: source_path.clone(),
                source,
            })?
        } else {
            String::new()
        };

        documents.push(Document {
            kind,
            source_path,
            relative_path,
            text,
        });
    }

    documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(documents)
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MARKDOWN_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{article_text, document_paths, setup_fixtures, write_file};
    use tempfile::TempDir;

    #[test]
    fn scan_finds_every_kind() {
        let tmp = setup_fixtures();
        let sources = scan(tmp.path()).unwrap();
        assert_eq!(sources.articles.len(), 6);
        assert_eq!(sources.about.len(), 1);
        assert_eq!(sources.index.len(), 1);
        assert_eq!(sources.statics.len(), 2);
    }

    #[test]
    fn articles_sorted_by_relative_path() {
        let tmp = setup_fixtures();
        let sources = scan(tmp.path()).unwrap();
        assert_eq!(
            document_paths(&sources.articles),
            vec![
                "ops/deploy.md",
                "ops/notes.md",
                "rust/async/pinning.md",
                "rust/lifetimes.md",
                "rust/notes.md",
                "rust/ownership.md",
            ]
        );
    }

    #[test]
    fn relative_path_is_relative_to_kind_dir() {
        let tmp = setup_fixtures();
        let sources = scan(tmp.path()).unwrap();
        let doc = &sources.articles[0];
        assert_eq!(doc.kind, DocumentKind::Article);
        assert_eq!(doc.identity(), "ops/deploy.md");
        assert!(doc.source_path.ends_with("article/ops/deploy.md"));
        assert!(doc.text.starts_with("title:"));
    }

    #[test]
    fn config_loaded_from_fixtures() {
        let tmp = setup_fixtures();
        let sources = scan(tmp.path()).unwrap();
        assert_eq!(sources.config.site.title, "Fixture Notes");
        assert_eq!(
            sources.config.site.domain.as_deref(),
            Some("notes.example.com")
        );
    }

    #[test]
    fn non_markdown_files_ignored_outside_static() {
        let tmp = setup_fixtures();
        let sources = scan(tmp.path()).unwrap();
        assert!(
            sources
                .articles
                .iter()
                .all(|d| !d.identity().ends_with(".txt"))
        );
    }

    #[test]
    fn static_files_are_not_read() {
        let tmp = setup_fixtures();
        let sources = scan(tmp.path()).unwrap();
        assert_eq!(
            document_paths(&sources.statics),
            vec!["css/extra.css", "logo.svg"]
        );
        assert!(sources.statics.iter().all(|d| d.text.is_empty()));
    }

    #[test]
    fn missing_directories_yield_nothing() {
        let tmp = TempDir::new().unwrap();
        let sources = scan(tmp.path()).unwrap();
        assert!(sources.articles.is_empty());
        assert!(sources.about.is_empty());
        assert!(sources.index.is_empty());
        assert!(sources.statics.is_empty());
        assert_eq!(sources.config.paths.article_root, "article");
    }

    #[test]
    fn hidden_entries_skipped() {
        let tmp = TempDir::new().unwrap();
        let text = article_text("A", "01/01/2020", "Body");
        write_file(tmp.path(), "article/a.md", &text);
        write_file(tmp.path(), "article/.draft.md", &text);
        write_file(tmp.path(), "article/.drafts/b.md", &text);
        write_file(tmp.path(), "static/.DS_Store", "junk");

        let sources = scan(tmp.path()).unwrap();
        assert_eq!(document_paths(&sources.articles), vec!["a.md"]);
        assert!(sources.statics.is_empty());
    }

    #[test]
    fn every_markdown_extension_is_recognized() {
        for ext in MARKDOWN_EXTENSIONS {
            assert!(is_markdown(Path::new(&format!("post.{ext}"))), "{ext}");
        }
        assert!(is_markdown(Path::new("POST.MD")));
        assert!(!is_markdown(Path::new("post.txt")));
        assert!(!is_markdown(Path::new("README")));
    }

    #[test]
    fn markdown_documents_lists_articles_first() {
        let tmp = setup_fixtures();
        let sources = scan(tmp.path()).unwrap();
        let kinds: Vec<DocumentKind> = sources.markdown_documents().map(|d| d.kind).collect();
        assert_eq!(kinds.len(), 8);
        assert_eq!(kinds[0], DocumentKind::Article);
        assert_eq!(kinds[6], DocumentKind::About);
        assert_eq!(kinds[7], DocumentKind::Index);
    }

    #[test]
    fn documents_by_kind() {
        let tmp = setup_fixtures();
        let sources = scan(tmp.path()).unwrap();
        assert_eq!(sources.documents(DocumentKind::About).len(), 1);
        assert_eq!(sources.documents(DocumentKind::Static).len(), 2);
    }

    #[test]
    fn invalid_config_fails_scan() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "config.toml", "[site]\nbogus = 1\n");
        assert!(matches!(scan(tmp.path()), Err(ScanError::Config(_))));
    }
}
