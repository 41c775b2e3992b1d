//! Shared test utilities for the simple-blog test suite.
//!
//! Provides fixture setup, document builders, and archive tree assertions.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let sources = scan(tmp.path()).unwrap();
//!
//! let tree = build_archive(&entries, &ArchiveTree::default());
//! assert_tree_shape(&tree, &[
//!     ("ops", &["Deploying on Fridays"]),
//!     ("rust", &["Ownership"]),
//! ]);
//! ```

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::archive::{ArchiveEntry, ArchiveTree, Topic};
use crate::types::{Document, DocumentKind, DocumentMeta, RenderedDocument};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A markdown document with the two required metadata fields.
pub fn article_text(title: &str, date: &str, body: &str) -> String {
    format!("title: {title}\ndate: {date}\n\n{body}\n")
}

// =========================================================================
// Document builders
// =========================================================================

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A rendered document as the process stage would produce it.
pub fn rendered(kind: DocumentKind, relative: &str, title: &str, on: NaiveDate) -> RenderedDocument {
    RenderedDocument {
        document: Document {
            kind,
            source_path: PathBuf::from("/content").join(kind.dir_name()).join(relative),
            relative_path: PathBuf::from(relative),
            text: String::new(),
        },
        metadata: Default::default(),
        meta: DocumentMeta {
            title: title.to_string(),
            date: on,
        },
        html: format!("<p>{title} body</p>\n"),
    }
}

pub fn rendered_article(relative: &str, title: &str, y: i32, m: u32, d: u32) -> RenderedDocument {
    rendered(DocumentKind::Article, relative, title, date(y, m, d))
}

pub fn archive_entry(path: &str, title: &str, y: i32, m: u32, d: u32) -> ArchiveEntry {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    ArchiveEntry {
        path: path.to_string(),
        title: title.to_string(),
        url: format!("/article/{stem}.html"),
        date: date(y, m, d),
    }
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Relative paths of documents, `/`-separated, in order.
pub fn document_paths(documents: &[Document]) -> Vec<String> {
    documents.iter().map(Document::identity).collect()
}

/// Names of a topic's direct sub-topics, in order.
pub fn topic_names(topic: &Topic) -> Vec<&str> {
    topic.topics().map(|t| t.name.as_str()).collect()
}

/// Titles of a topic's direct pages, in order.
pub fn page_titles(topic: &Topic) -> Vec<&str> {
    topic.pages().map(|p| p.title.as_str()).collect()
}

// =========================================================================
// Tree assertions
// =========================================================================

/// Assert the top level of an archive tree: topic names in order, each with
/// the titles of its direct pages. The root must hold no bare pages.
///
/// ```rust
/// assert_tree_shape(&tree, &[("a", &["X", "Z"]), ("b", &["Y"])]);
/// ```
pub fn assert_tree_shape(tree: &ArchiveTree, expected: &[(&str, &[&str])]) {
    assert!(
        page_titles(&tree.root).is_empty(),
        "root has bare pages: {:?}",
        page_titles(&tree.root)
    );
    let actual: Vec<(&str, Vec<&str>)> = tree
        .root
        .topics()
        .map(|t| (t.name.as_str(), page_titles(t)))
        .collect();
    let expected: Vec<(&str, Vec<&str>)> = expected
        .iter()
        .map(|(name, titles)| (*name, titles.to_vec()))
        .collect();
    assert_eq!(actual, expected, "archive tree shape mismatch");
}
