//! Build pipeline.
//!
//! Stages run strictly in order, each a method taking the previous stage's
//! output:
//!
//! ```text
//! 1. Load      content/      →  SourceSet       (config + documents)
//! 2. Process   SourceSet     →  Processed       (metadata + HTML, parallel)
//! 3. Generate  Processed     →  GeneratedSite   (pages + archive tree)
//! 4. Write     GeneratedSite →  dist/           (pages, statics, CNAME, sitemap)
//! 5. Commit    archive tree  →  state dir       (snapshot for the next build)
//! ```
//!
//! The first error aborts the build. The archive snapshot is only replaced
//! once everything else has been written, so a failed build never changes
//! the ordering the next one starts from.

use crate::archive::ArchiveTree;
use crate::config::{ConfigError, SiteConfig};
use crate::generate::{self, GenerateError, GeneratedSite};
use crate::meta::{self, MalformedDocument};
use crate::render::{DocumentRenderer, RenderError};
use crate::scan::{self, ScanError, SourceSet};
use crate::sitemap::{SITEMAP_FILE, Sitemap};
use crate::state::{ArchiveStateStore, StateError};
use crate::types::{Document, RenderedDocument};
use crate::write::{self, WriteError};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Malformed(#[from] MalformedDocument),
    #[error("{}: {source}", .path.display())]
    Render { path: PathBuf, source: RenderError },
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("cannot save archive snapshot: {0}")]
    State(#[from] StateError),
}

/// Rendered markdown documents, grouped like [`SourceSet`].
#[derive(Debug, Default)]
pub struct Processed {
    pub articles: Vec<RenderedDocument>,
    pub about: Vec<RenderedDocument>,
    pub index: Vec<RenderedDocument>,
}

impl Processed {
    pub fn len(&self) -> usize {
        self.articles.len() + self.about.len() + self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the write stage put on disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub removed: usize,
    pub pages: usize,
    pub statics: usize,
    pub cname: bool,
    pub sitemap: bool,
}

/// Outcome of a full build or check.
#[derive(Debug)]
pub struct BuildReport {
    pub sources: SourceSet,
    pub processed: Processed,
    pub site: GeneratedSite,
    /// `None` for a check, which writes nothing.
    pub written: Option<WriteSummary>,
}

pub struct Pipeline {
    source: PathBuf,
    output: PathBuf,
    store: ArchiveStateStore,
    renderer: DocumentRenderer,
}

impl Pipeline {
    pub fn new(source: &Path, output: &Path, state_dir: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            store: ArchiveStateStore::new(state_dir),
            renderer: DocumentRenderer::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: DocumentRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn store(&self) -> &ArchiveStateStore {
        &self.store
    }

    /// Stage 1: read config and every source document.
    pub fn load(&self) -> Result<SourceSet, BuildError> {
        Ok(scan::scan(&self.source)?)
    }

    /// Stage 2: parse metadata and render markdown for every document.
    ///
    /// Documents are independent, so this runs on the rayon pool. Results
    /// keep discovery order and the first failure in that order is reported.
    pub fn process(&self, sources: &SourceSet) -> Result<Processed, BuildError> {
        let processed = Processed {
            articles: self.process_all(&sources.articles)?,
            about: self.process_all(&sources.about)?,
            index: self.process_all(&sources.index)?,
        };
        tracing::debug!(documents = processed.len(), "Processed documents");
        Ok(processed)
    }

    fn process_all(&self, documents: &[Document]) -> Result<Vec<RenderedDocument>, BuildError> {
        let results: Vec<Result<RenderedDocument, BuildError>> = documents
            .par_iter()
            .map(|doc| process_document(doc, &self.renderer))
            .collect();
        results.into_iter().collect()
    }

    /// Stage 3: generate pages, merging the archive with the stored history.
    pub fn generate(
        &self,
        config: &SiteConfig,
        processed: &Processed,
    ) -> Result<GeneratedSite, BuildError> {
        let history = self.store.load();
        self.generate_with_history(config, processed, &history)
    }

    pub fn generate_with_history(
        &self,
        config: &SiteConfig,
        processed: &Processed,
        history: &ArchiveTree,
    ) -> Result<GeneratedSite, BuildError> {
        Ok(generate::generate(
            config,
            &processed.articles,
            &processed.about,
            &processed.index,
            history,
        )?)
    }

    /// Stage 4: replace the output tree.
    ///
    /// Refuses to start when the output root would swallow the content
    /// directory or the archive snapshot.
    pub fn write(&self, sources: &SourceSet, site: &GeneratedSite) -> Result<WriteSummary, BuildError> {
        write::check_output_location(&self.output, &[self.source.as_path(), self.store.path()])?;
        let mut summary = WriteSummary {
            removed: write::clean_output(&self.output)?,
            pages: write::write_pages(&self.output, &site.pages)?,
            statics: write::copy_statics(&self.output, &sources.statics)?,
            ..WriteSummary::default()
        };

        match &sources.config.site.domain {
            Some(domain) => {
                write::write_cname(&self.output, domain)?;
                let sitemap = Sitemap::from_pages(domain, &site.pages, &site.dates);
                write::write_file(&self.output, SITEMAP_FILE, &sitemap.to_xml())?;
                summary.cname = true;
                summary.sitemap = true;
            }
            None => {
                tracing::info!("No site.domain configured, skipping CNAME and sitemap.xml");
            }
        }
        Ok(summary)
    }

    /// Stage 5: persist the archive tree for the next build.
    pub fn commit(&self, site: &GeneratedSite) -> Result<(), BuildError> {
        self.store.save(&site.archive)?;
        Ok(())
    }

    /// Run every stage.
    pub fn run(&self) -> Result<BuildReport, BuildError> {
        let sources = self.load()?;
        let processed = self.process(&sources)?;
        let site = self.generate(&sources.config, &processed)?;
        let written = self.write(&sources, &site)?;
        self.commit(&site)?;
        Ok(BuildReport {
            sources,
            processed,
            site,
            written: Some(written),
        })
    }

    /// Load, process and generate in memory. Nothing is written, the
    /// snapshot included.
    pub fn check(&self) -> Result<BuildReport, BuildError> {
        let sources = self.load()?;
        let processed = self.process(&sources)?;
        let site = self.generate(&sources.config, &processed)?;
        Ok(BuildReport {
            sources,
            processed,
            site,
            written: None,
        })
    }
}

/// Split off the metadata block, check required fields, render the body.
pub fn process_document(
    doc: &Document,
    renderer: &DocumentRenderer,
) -> Result<RenderedDocument, BuildError> {
    let (metadata, body) = meta::parse(&doc.text);
    let required = meta::require(&metadata, &doc.source_path)?;
    let html = renderer
        .render(body)
        .map_err(|source| BuildError::Render {
            path: doc.source_path.clone(),
            source,
        })?;
    Ok(RenderedDocument {
        document: doc.clone(),
        metadata,
        meta: required,
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{article_text, setup_fixtures, write_file};
    use crate::types::DocumentKind;
    use std::fs;
    use tempfile::TempDir;

    fn document(text: &str) -> Document {
        Document {
            kind: DocumentKind::Article,
            source_path: PathBuf::from("/content/article/a/x.md"),
            relative_path: PathBuf::from("a/x.md"),
            text: text.to_string(),
        }
    }

    fn pipeline(content: &Path, work: &TempDir) -> Pipeline {
        Pipeline::new(content, &work.path().join("dist"), &work.path().join("state"))
    }

    #[test]
    fn process_document_strips_metadata_and_renders() {
        let doc = document("title: X\ndate: 01/02/2020\ntags: a\n\n# Heading\n");
        let rendered = process_document(&doc, &DocumentRenderer::default()).unwrap();
        assert_eq!(rendered.meta.title, "X");
        assert_eq!(rendered.metadata["tags"], vec!["a"]);
        assert!(rendered.html.contains("<h1>Heading</h1>"));
        assert!(!rendered.html.contains("title:"));
    }

    #[test]
    fn process_document_reports_missing_field() {
        let doc = document("title: X\n\nBody");
        let err = process_document(&doc, &DocumentRenderer::default()).unwrap_err();
        assert!(matches!(err, BuildError::Malformed(ref m) if m.field() == "date"));
        assert!(err.to_string().contains("/content/article/a/x.md"));
    }

    #[test]
    fn render_errors_carry_the_source_path() {
        let doc = document("title: X\ndate: 01/02/2020\n\n```<bad>\nx\n```\n");
        let err = process_document(&doc, &DocumentRenderer::default()).unwrap_err();
        assert!(matches!(err, BuildError::Render { .. }));
        assert!(err.to_string().starts_with("/content/article/a/x.md"));
    }

    #[test]
    fn process_keeps_discovery_order() {
        let content = setup_fixtures();
        let work = TempDir::new().unwrap();
        let pipeline = pipeline(content.path(), &work);
        let sources = pipeline.load().unwrap();
        let processed = pipeline.process(&sources).unwrap();
        let order: Vec<String> = processed
            .articles
            .iter()
            .map(|d| d.document.identity())
            .collect();
        let expected: Vec<String> = sources.articles.iter().map(|d| d.identity()).collect();
        assert_eq!(order, expected);
        assert_eq!(processed.len(), 8);
    }

    #[test]
    fn run_writes_site_and_snapshot() {
        let content = setup_fixtures();
        let work = TempDir::new().unwrap();
        let pipeline = pipeline(content.path(), &work);

        let report = pipeline.run().unwrap();
        let written = report.written.unwrap();

        assert_eq!(written.pages, 10);
        assert_eq!(written.statics, 2);
        assert!(written.cname && written.sitemap);
        let dist = work.path().join("dist");
        for path in [
            "index.html",
            "about.html",
            "timeline.html",
            "archive.html",
            "article/notes.html",
            "article/notes-conflict.html",
            "static/logo.svg",
            "static/css/extra.css",
            "CNAME",
            "sitemap.xml",
        ] {
            assert!(dist.join(path).exists(), "missing {path}");
        }
        assert!(pipeline.store().path().exists());
    }

    #[test]
    fn no_domain_skips_cname_and_sitemap() {
        let content = setup_fixtures();
        fs::write(content.path().join("config.toml"), "[site]\ntitle = \"T\"\n").unwrap();
        let work = TempDir::new().unwrap();

        let written = pipeline(content.path(), &work).run().unwrap().written.unwrap();
        assert!(!written.cname);
        assert!(!written.sitemap);
        assert!(!work.path().join("dist/CNAME").exists());
        assert!(!work.path().join("dist/sitemap.xml").exists());
    }

    #[test]
    fn check_writes_nothing() {
        let content = setup_fixtures();
        let work = TempDir::new().unwrap();
        let pipeline = pipeline(content.path(), &work);

        let report = pipeline.check().unwrap();
        assert!(report.written.is_none());
        assert_eq!(report.site.pages.len(), 10);
        assert!(!work.path().join("dist").exists());
        assert!(!pipeline.store().path().exists());
    }

    #[test]
    fn failed_build_keeps_previous_snapshot() {
        let content = setup_fixtures();
        let work = TempDir::new().unwrap();
        let pipeline = pipeline(content.path(), &work);
        pipeline.run().unwrap();
        let before = fs::read_to_string(pipeline.store().path()).unwrap();

        write_file(content.path(), "article/new/broken.md", "title: no date\n\nBody");
        assert!(matches!(pipeline.run(), Err(BuildError::Malformed(_))));

        let after = fs::read_to_string(pipeline.store().path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn output_over_content_is_refused_before_cleaning() {
        let content = setup_fixtures();
        let work = TempDir::new().unwrap();
        let pipeline = Pipeline::new(content.path(), content.path(), &work.path().join("state"));

        let err = pipeline.run().unwrap_err();
        assert!(matches!(
            err,
            BuildError::Write(WriteError::OutputOverlap { .. })
        ));
        assert!(content.path().join("about/about.md").exists());
        assert!(content.path().join("index/index.md").exists());
        assert!(!pipeline.store().path().exists());
    }

    #[test]
    fn output_over_state_dir_is_refused() {
        let content = setup_fixtures();
        let work = TempDir::new().unwrap();
        let pipeline = Pipeline::new(content.path(), work.path(), &work.path().join("state"));

        assert!(matches!(
            pipeline.run(),
            Err(BuildError::Write(WriteError::OutputOverlap { .. }))
        ));
    }

    #[test]
    fn cardinality_error_aborts_build() {
        let content = TempDir::new().unwrap();
        write_file(content.path(), "index/index.md", &article_text("Home", "01/01/2020", "hi"));
        write_file(content.path(), "article/a.md", &article_text("A", "01/01/2020", "a"));
        let work = TempDir::new().unwrap();

        let err = pipeline(content.path(), &work).run().unwrap_err();
        assert!(matches!(
            err,
            BuildError::Generate(GenerateError::Cardinality { .. })
        ));
        assert!(!work.path().join("dist").exists());
    }
}
