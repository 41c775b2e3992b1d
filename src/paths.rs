//! Output path allocation for article pages.
//!
//! An article's page lives at `<article_root>/<stem>.html`, where `<stem>` is
//! the source file name without its extension. Only the base name is used, so
//! `a/post.md` and `b/post.md` both want `article/post.html`.
//!
//! ## Collisions
//!
//! The allocator remembers every path handed out in the current build. When a
//! candidate is taken, the conflict suffix is inserted before `.html`,
//! numbered from the second conflict on:
//!
//! ```text
//! article/post.html
//! article/post-conflict.html
//! article/post-conflict2.html
//! article/post-conflict3.html
//! ```
//!
//! Each retry starts again from the unsuffixed stem, so names never grow by
//! more than one suffix. The outcome depends on allocation order, which is the
//! discovery order of the articles and is therefore fixed for a given content
//! tree.

use crate::config::ConfigError;
use std::collections::HashSet;
use std::path::Path;

/// Inserted before `.html` when a path is already taken.
pub const CONFLICT_SUFFIX: &str = "-conflict";

const HTML_EXT: &str = ".html";

#[derive(Debug, Clone)]
pub struct PathAllocator {
    article_root: String,
    allocated: HashSet<String>,
}

impl PathAllocator {
    /// Create an allocator placing pages under `article_root`.
    ///
    /// An empty root means the required configuration is missing.
    pub fn new(article_root: &str) -> Result<Self, ConfigError> {
        let article_root = article_root.trim_matches('/');
        if article_root.is_empty() {
            return Err(ConfigError::Missing("paths.article_root"));
        }
        Ok(Self {
            article_root: article_root.to_string(),
            allocated: HashSet::new(),
        })
    }

    /// Mark paths as taken without allocating them (special pages).
    pub fn reserve<'a>(&mut self, paths: impl IntoIterator<Item = &'a str>) {
        self.allocated
            .extend(paths.into_iter().map(|p| p.trim_start_matches('/').to_string()));
    }

    /// The path a source would get if nothing collided.
    pub fn candidate(&self, relative_path: &Path) -> String {
        let stem = relative_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        format!("{}/{}{}", self.article_root, stem, HTML_EXT)
    }

    /// Allocate a unique output path for a source file and register it.
    pub fn allocate(&mut self, relative_path: &Path) -> String {
        let base = self.candidate(relative_path);
        let mut path = base.clone();
        let mut attempt = 1;
        while self.allocated.contains(&path) {
            path = with_conflict_suffix(&base, attempt);
            attempt += 1;
        }
        self.allocated.insert(path.clone());
        path
    }

    pub fn is_allocated(&self, path: &str) -> bool {
        self.allocated.contains(path)
    }
}

/// `dir/post.html` → `dir/post-conflict.html` (n = 1) or `dir/post-conflictN.html`.
fn with_conflict_suffix(base: &str, n: usize) -> String {
    let stem = base.strip_suffix(HTML_EXT).unwrap_or(base);
    if n == 1 {
        format!("{stem}{CONFLICT_SUFFIX}{HTML_EXT}")
    } else {
        format!("{stem}{CONFLICT_SUFFIX}{n}{HTML_EXT}")
    }
}
