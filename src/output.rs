//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Every document is shown by its positional index and title, with the source
//! path as an indented `Source:` context line. The output reads as a content
//! inventory while still letting users trace entries back to files.
//!
//! # Output Format
//!
//! ## Load
//!
//! ```text
//! Articles (6)
//! 001 ops/deploy.md
//! 002 ops/notes.md
//! About (1)
//! 001 about.md
//! Index (1)
//! 001 index.md
//! Static (2)
//! 001 css/extra.css
//!
//! Config
//!     Title: Fixture Notes
//!     Domain: notes.example.com
//! ```
//!
//! ## Process
//!
//! ```text
//! 001 Deploying on Fridays (2021-01-10)
//!     Source: ops/deploy.md
//! ```
//!
//! ## Generate
//!
//! ```text
//! Articles
//! 001 Deploying on Fridays → article/deploy.html
//!
//! Pages
//! About → about.html
//! Index → index.html
//!
//! Archive
//! 001 ops
//!     001 Deploying on Fridays
//!
//! Generated 6 article pages, 4 site pages
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::archive::{Topic, TopicEntry};
use crate::generate::GeneratedSite;
use crate::pipeline::{Processed, WriteSummary};
use crate::scan::SourceSet;
use crate::types::{Document, DocumentKind, RenderedDocument};
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Positional index + title, with optional detail in parentheses.
///
/// ```text
/// 001 Ownership (2021-03-01)
/// 001 rust
/// ```
fn entity_header(index: usize, title: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), title, d),
        None => format!("{} {}", format_index(index), title),
    }
}

fn section_title(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Article => "Articles",
        DocumentKind::About => "About",
        DocumentKind::Index => "Index",
        DocumentKind::Static => "Static",
    }
}

// ============================================================================
// Stage 1: Load output
// ============================================================================

pub fn format_load_output(sources: &SourceSet) -> Vec<String> {
    let mut lines = Vec::new();

    for kind in [
        DocumentKind::Article,
        DocumentKind::About,
        DocumentKind::Index,
        DocumentKind::Static,
    ] {
        let docs = sources.documents(kind);
        lines.push(format!("{} ({})", section_title(kind), docs.len()));
        lines.extend(source_lines(docs));
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    lines.push(format!("{}Title: {}", indent(1), sources.config.site.title));
    if let Some(domain) = &sources.config.site.domain {
        lines.push(format!("{}Domain: {}", indent(1), domain));
    }
    lines.push(format!(
        "{}Articles: {}/",
        indent(1),
        sources.config.paths.article_root
    ));
    lines
}

fn source_lines(docs: &[Document]) -> impl Iterator<Item = String> + '_ {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| format!("{} {}", format_index(i + 1), doc.identity()))
}

pub fn print_load_output(sources: &SourceSet) {
    for line in format_load_output(sources) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Process output
// ============================================================================

pub fn format_process_output(processed: &Processed) -> Vec<String> {
    let mut lines = Vec::new();
    let groups: [(&str, &[RenderedDocument]); 3] = [
        ("Articles", &processed.articles),
        ("About", &processed.about),
        ("Index", &processed.index),
    ];
    for (title, docs) in groups {
        if docs.is_empty() {
            continue;
        }
        lines.push(title.to_string());
        for (i, doc) in docs.iter().enumerate() {
            let date = doc.meta.date.format("%Y-%m-%d").to_string();
            lines.push(entity_header(i + 1, &doc.meta.title, Some(&date)));
            lines.push(format!("{}Source: {}", indent(1), doc.document.identity()));
        }
    }
    lines
}

pub fn print_process_output(processed: &Processed) {
    for line in format_process_output(processed) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 3: Generate output
// ============================================================================

pub fn format_generate_output(processed: &Processed, site: &GeneratedSite) -> Vec<String> {
    let mut lines = Vec::new();

    if !site.articles().is_empty() {
        lines.push("Articles".to_string());
        for (i, (doc, page)) in processed.articles.iter().zip(site.articles()).enumerate() {
            lines.push(format!(
                "{} {} → {}",
                format_index(i + 1),
                doc.meta.title,
                page.output_path
            ));
        }
        lines.push(String::new());
    }

    let specials = &site.pages[site.article_count..];
    lines.push("Pages".to_string());
    for (label, page) in ["About", "Index", "Timeline", "Archive"].iter().zip(specials) {
        lines.push(format!("{} → {}", label, page.output_path));
    }

    if !site.archive.is_empty() {
        lines.push(String::new());
        lines.push("Archive".to_string());
        format_topic(&site.archive.root, 0, &mut lines);
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {} article page{}, {} site pages",
        site.article_count,
        if site.article_count == 1 { "" } else { "s" },
        specials.len()
    ));
    lines
}

fn format_topic(topic: &Topic, depth: usize, lines: &mut Vec<String>) {
    let mut position = 0;
    for entry in &topic.entries {
        match entry {
            TopicEntry::Topic(child) => {
                position += 1;
                lines.push(format!(
                    "{}{}",
                    indent(depth),
                    entity_header(position, &child.name, None)
                ));
                format_topic(child, depth + 1, lines);
            }
            TopicEntry::Pages(pages) => {
                for page in pages {
                    position += 1;
                    lines.push(format!(
                        "{}{}",
                        indent(depth),
                        entity_header(position, &page.title, None)
                    ));
                }
            }
        }
    }
}

pub fn print_generate_output(processed: &Processed, site: &GeneratedSite) {
    for line in format_generate_output(processed, site) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 4: Write output
// ============================================================================

pub fn format_write_output(summary: &WriteSummary, output: &Path) -> Vec<String> {
    let mut lines = vec![format!("Output: {}", output.display())];
    if summary.removed > 0 {
        lines.push(format!("{}Removed: {} stale entries", indent(1), summary.removed));
    }
    lines.push(format!("{}Pages: {}", indent(1), summary.pages));
    lines.push(format!("{}Static files: {}", indent(1), summary.statics));
    let flag = |on: bool| if on { "written" } else { "skipped (no domain)" };
    lines.push(format!("{}CNAME: {}", indent(1), flag(summary.cname)));
    lines.push(format!("{}Sitemap: {}", indent(1), flag(summary.sitemap)));
    lines
}

pub fn print_write_output(summary: &WriteSummary, output: &Path) {
    for line in format_write_output(summary, output) {
        println!("{}", line);
    }
}
