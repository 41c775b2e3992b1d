//! # Simple Blog
//!
//! A static site generator for a markdown blog. Articles live in a directory
//! tree; the tree becomes the topic structure of the archive page, and the
//! archive keeps its order across rebuilds.
//!
//! # Architecture: Five-Stage Pipeline
//!
//! ```text
//! 1. Load      content/        →  SourceSet       (config + documents)
//! 2. Process   SourceSet       →  Processed       (metadata + HTML)
//! 3. Generate  Processed       →  GeneratedSite   (pages + archive tree)
//! 4. Write     GeneratedSite   →  dist/
//! 5. Commit    archive tree    →  .simple-blog-state/archive.xml
//! ```
//!
//! The stages are wired explicitly by [`pipeline::Pipeline`]; each takes the
//! previous stage's output as a plain value, so tests can run any stage on
//! hand-built input without touching the filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the content directory and reads every document |
//! | [`meta`] | Leading `key: value` metadata block parser |
//! | [`render`] | Markdown → HTML with a pluggable code highlighter |
//! | [`generate`] | Stage 3: article, about, index, timeline and archive pages |
//! | [`paths`] | Conflict-free output paths for article pages |
//! | [`archive`] | History-stable topic tree for the archive page |
//! | [`state`] | Archive snapshot persistence between builds |
//! | [`templates`] | Maud page layouts |
//! | [`write`] | Stage 4: output cleaning, pages, static files, CNAME |
//! | [`sitemap`] | `sitemap.xml` generation |
//! | [`pipeline`] | Stage composition and the aggregate build error |
//! | [`config`] | `config.toml` loading, validation and stock defaults |
//! | [`types`] | Types shared between stages |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Stable Archive Ordering
//!
//! Sorting the archive by date alone would reshuffle it whenever an old
//! article's date is corrected or a file is moved between topics. Instead the
//! previous build's tree is stored and replayed: known articles keep their
//! relative order, new ones are appended by date, deleted ones drop out. See
//! [`archive`] for the merge and [`state`] for the on-disk format.
//!
//! ## Flat Article URLs
//!
//! Article pages live at `<article_root>/<file name>.html` regardless of
//! topic, so moving a file between topics does not break its URL. Name
//! clashes are settled in discovery order by [`paths::PathAllocator`].
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): templates are
//! checked at compile time and every interpolation is escaped unless wrapped
//! in `PreEscaped`, which is reserved for rendered markdown.

pub mod archive;
pub mod config;
pub mod generate;
pub mod meta;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod render;
pub mod scan;
pub mod sitemap;
pub mod state;
pub mod templates;
pub mod types;
pub mod write;

#[cfg(test)]
pub(crate) mod test_helpers;
