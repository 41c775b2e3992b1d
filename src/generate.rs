//! Page generation.
//!
//! Stage 3 of the build pipeline. Turns rendered documents into [`Page`]s:
//!
//! - **Article pages** (`<article_root>/<name>.html`): one per article, with
//!   paths handed out by a [`PathAllocator`] in discovery order
//! - **About page** and **index page**: exactly one source document each
//! - **Timeline page**: every article, newest first
//! - **Archive page**: the history-stable topic tree from [`crate::archive`]
//!
//! ## Page → document side table
//!
//! Pages carry only their path and HTML. The timeline and archive need each
//! article's title, date and source path, so article generation records
//! which [`RenderedDocument`] every article page came from in an
//! [`ArticleLinks`] table keyed by [`PageId`]. The table is passed explicitly
//! to the later generators.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── about.html
//! ├── timeline.html
//! ├── archive.html
//! └── article/
//!     ├── ownership.html
//!     ├── notes.html
//!     └── notes-conflict.html     # second `notes.md`, different topic
//! ```

use crate::archive::{ArchiveEntry, ArchiveTree, build_archive};
use crate::config::{ConfigError, PathsConfig, SiteConfig};
use crate::paths::PathAllocator;
use crate::templates::{self, SiteContext, TimelineItem};
use crate::types::{DocumentKind, Page, PageId, RenderedDocument};
use chrono::NaiveDate;
use maud::Markup;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("expected exactly one {kind} document, found {found}")]
    Cardinality { kind: DocumentKind, found: usize },
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("page {} (id {}) is not linked to a source document", .path, .id.0)]
    UnlinkedPage { id: PageId, path: String },
}

/// Hands out page identifiers in generation order.
#[derive(Debug, Default)]
pub struct PageIds {
    next: usize,
}

impl PageIds {
    pub fn next_id(&mut self) -> PageId {
        let id = PageId(self.next);
        self.next += 1;
        id
    }

    fn page(&mut self, output_path: impl Into<String>, content: Markup) -> Page {
        Page {
            id: self.next_id(),
            output_path: output_path.into(),
            content: content.into_string(),
        }
    }
}

/// Which rendered document each article page was generated from.
#[derive(Debug, Default)]
pub struct ArticleLinks<'a> {
    by_page: HashMap<PageId, &'a RenderedDocument>,
}

impl<'a> ArticleLinks<'a> {
    pub fn link(&mut self, id: PageId, doc: &'a RenderedDocument) {
        self.by_page.insert(id, doc);
    }

    pub fn get(&self, id: PageId) -> Option<&'a RenderedDocument> {
        self.by_page.get(&id).copied()
    }

    pub fn resolve(&self, page: &Page) -> Result<&'a RenderedDocument, GenerateError> {
        self.get(page.id).ok_or_else(|| GenerateError::UnlinkedPage {
            id: page.id,
            path: page.output_path.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.by_page.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_page.is_empty()
    }
}

// ============================================================================
// Generators
// ============================================================================

/// One page per article at an allocator-assigned path.
#[derive(Debug)]
pub struct ArticlePageGenerator {
    allocator: PathAllocator,
}

impl ArticlePageGenerator {
    /// The allocator is seeded with the special page paths, so no article can
    /// take the place of the index, timeline, archive or about page.
    pub fn new(paths: &PathsConfig) -> Result<Self, GenerateError> {
        let mut allocator = PathAllocator::new(&paths.article_root)?;
        allocator.reserve(paths.special_pages().iter().map(|(_, path)| *path));
        Ok(Self { allocator })
    }

    /// Generate pages in the order given and record each page's source.
    pub fn generate<'a>(
        &mut self,
        ids: &mut PageIds,
        site: &SiteContext,
        articles: &'a [RenderedDocument],
        links: &mut ArticleLinks<'a>,
    ) -> Vec<Page> {
        articles
            .iter()
            .map(|doc| {
                let output_path = self.allocator.allocate(&doc.document.relative_path);
                let page = ids.page(output_path, templates::render_article(site, doc));
                links.link(page.id, doc);
                page
            })
            .collect()
    }
}

/// The only document of a singleton kind.
pub fn exactly_one(
    kind: DocumentKind,
    docs: &[RenderedDocument],
) -> Result<&RenderedDocument, GenerateError> {
    match docs {
        [doc] => Ok(doc),
        _ => Err(GenerateError::Cardinality {
            kind,
            found: docs.len(),
        }),
    }
}

pub fn about_page(
    ids: &mut PageIds,
    site: &SiteContext,
    paths: &PathsConfig,
    docs: &[RenderedDocument],
) -> Result<Page, GenerateError> {
    let doc = exactly_one(DocumentKind::About, docs)?;
    Ok(ids.page(
        output_path(&paths.about_page),
        templates::render_about(site, doc),
    ))
}

pub fn index_page(
    ids: &mut PageIds,
    site: &SiteContext,
    paths: &PathsConfig,
    docs: &[RenderedDocument],
) -> Result<Page, GenerateError> {
    let doc = exactly_one(DocumentKind::Index, docs)?;
    Ok(ids.page(
        output_path(&paths.index_page),
        templates::render_index(site, doc),
    ))
}

/// Timeline rows, newest first. Articles sharing a date keep their
/// generation order.
pub fn timeline_items(
    articles: &[Page],
    links: &ArticleLinks<'_>,
) -> Result<Vec<TimelineItem>, GenerateError> {
    let mut items = articles
        .iter()
        .map(|page| {
            let doc = links.resolve(page)?;
            Ok(TimelineItem {
                title: doc.meta.title.clone(),
                url: page.url(),
                date: doc.meta.date,
            })
        })
        .collect::<Result<Vec<_>, GenerateError>>()?;
    items.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(items)
}

pub fn timeline_page(
    ids: &mut PageIds,
    site: &SiteContext,
    paths: &PathsConfig,
    articles: &[Page],
    links: &ArticleLinks<'_>,
) -> Result<Page, GenerateError> {
    let items = timeline_items(articles, links)?;
    Ok(ids.page(
        output_path(&paths.timeline_page),
        templates::render_timeline(site, &items),
    ))
}

/// Resolve article pages back to `(source path, title, url, date)`.
pub fn archive_entries(
    articles: &[Page],
    links: &ArticleLinks<'_>,
) -> Result<Vec<ArchiveEntry>, GenerateError> {
    articles
        .iter()
        .map(|page| {
            let doc = links.resolve(page)?;
            Ok(ArchiveEntry {
                path: doc.document.identity(),
                title: doc.meta.title.clone(),
                url: page.url(),
                date: doc.meta.date,
            })
        })
        .collect()
}

pub fn archive_page(
    ids: &mut PageIds,
    site: &SiteContext,
    paths: &PathsConfig,
    tree: &ArchiveTree,
) -> Page {
    ids.page(
        output_path(&paths.archive_page),
        templates::render_archive(site, tree),
    )
}

fn output_path(configured: &str) -> String {
    configured.trim_start_matches('/').to_string()
}

// ============================================================================
// Stage entry point
// ============================================================================

/// Everything the generate stage produces.
#[derive(Debug)]
pub struct GeneratedSite {
    /// Every page, in generation order: articles, about, index, timeline, archive.
    pub pages: Vec<Page>,
    /// Number of leading entries of `pages` that are articles.
    pub article_count: usize,
    /// New archive tree; becomes the snapshot once the build succeeds.
    pub archive: ArchiveTree,
    /// Article dates by page, for the sitemap.
    pub dates: HashMap<PageId, NaiveDate>,
}

impl GeneratedSite {
    pub fn articles(&self) -> &[Page] {
        &self.pages[..self.article_count]
    }
}

/// Generate every page of the site.
///
/// `history` is the archive tree of the previous build.
pub fn generate(
    config: &SiteConfig,
    articles: &[RenderedDocument],
    about: &[RenderedDocument],
    index: &[RenderedDocument],
    history: &ArchiveTree,
) -> Result<GeneratedSite, GenerateError> {
    // Singleton checks come first so a bad content tree fails before any work.
    exactly_one(DocumentKind::About, about)?;
    exactly_one(DocumentKind::Index, index)?;

    let site = SiteContext::new(config);
    let paths = &config.paths;
    let mut ids = PageIds::default();
    let mut links = ArticleLinks::default();

    let mut article_gen = ArticlePageGenerator::new(paths)?;
    let mut pages = article_gen.generate(&mut ids, &site, articles, &mut links);
    let article_count = pages.len();
    tracing::debug!(articles = article_count, "Generated article pages");

    let about = about_page(&mut ids, &site, paths, about)?;
    let index = index_page(&mut ids, &site, paths, index)?;
    let timeline = timeline_page(&mut ids, &site, paths, &pages, &links)?;

    let entries = archive_entries(&pages, &links)?;
    let archive = build_archive(&entries, history);
    tracing::debug!(
        pages = archive.len(),
        topics = archive.root.topics().count(),
        "Built archive tree"
    );
    let archive_html = archive_page(&mut ids, &site, paths, &archive);

    let dates = pages
        .iter()
        .filter_map(|page| links.get(page.id).map(|doc| (page.id, doc.meta.date)))
        .collect();

    pages.extend([about, index, timeline, archive_html]);
    Ok(GeneratedSite {
        pages,
        article_count,
        archive,
        dates,
    })
}

// ============================================================================
// Tests
// ============================================================================
