//! HTML templates.
//!
//! Every page shares one layout: a header with the site title and a
//! navigation bar linking the index, timeline, archive and about pages,
//! followed by the page body. Rendered markdown is inserted pre-escaped;
//! everything else goes through maud's automatic escaping.
//!
//! The stylesheet is embedded at compile time from `static/style.css`.

use crate::archive::{ArchiveTree, Topic, TopicEntry};
use crate::config::SiteConfig;
use crate::types::RenderedDocument;
use chrono::NaiveDate;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS: &str = include_str!("../static/style.css");

/// Display format of dates on pages.
const DISPLAY_DATE: &str = "%d %B %Y";

/// Which navigation entry a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Index,
    Timeline,
    Archive,
    About,
    Article,
}

/// Site-wide values every template needs.
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub title: String,
    pub index_url: String,
    pub timeline_url: String,
    pub archive_url: String,
    pub about_url: String,
}

impl SiteContext {
    pub fn new(config: &SiteConfig) -> Self {
        let url = |path: &str| format!("/{}", path.trim_start_matches('/'));
        Self {
            title: config.site.title.clone(),
            index_url: url(&config.paths.index_page),
            timeline_url: url(&config.paths.timeline_page),
            archive_url: url(&config.paths.archive_page),
            about_url: url(&config.paths.about_page),
        }
    }
}

/// One row of the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineItem {
    pub title: String,
    pub url: String,
    pub date: NaiveDate,
}

// ============================================================================
// Layout
// ============================================================================

fn base_document(site: &SiteContext, page_title: &str, body_class: &str, content: Markup) -> Markup {
    let full_title = if page_title == site.title {
        site.title.clone()
    } else {
        format!("{page_title} · {}", site.title)
    };
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (full_title) }
                style { (PreEscaped(CSS)) }
            }
            body class=(body_class) {
                (site_header(site, body_class))
                main { (content) }
            }
        }
    }
}

fn site_header(site: &SiteContext, current: &str) -> Markup {
    let links = [
        ("index", "Home", &site.index_url),
        ("timeline", "Timeline", &site.timeline_url),
        ("archive", "Archive", &site.archive_url),
        ("about", "About", &site.about_url),
    ];
    html! {
        header.site-header {
            a.site-title href=(site.index_url) { (site.title) }
            nav.site-nav {
                ul {
                    @for (class, label, url) in links {
                        li class=[(class == current).then_some("current")] {
                            a href=(url) { (label) }
                        }
                    }
                }
            }
        }
    }
}

fn section_class(section: Section) -> &'static str {
    match section {
        Section::Index => "index",
        Section::Timeline => "timeline",
        Section::Archive => "archive",
        Section::About => "about",
        Section::Article => "article",
    }
}

fn date_line(date: NaiveDate) -> Markup {
    html! {
        time datetime=(date.format("%Y-%m-%d").to_string()) {
            (date.format(DISPLAY_DATE).to_string())
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

pub fn render_article(site: &SiteContext, doc: &RenderedDocument) -> Markup {
    let content = html! {
        article.post {
            h1 { (doc.meta.title) }
            p.post-date { (date_line(doc.meta.date)) }
            div.post-body { (PreEscaped(&doc.html)) }
        }
    };
    base_document(site, &doc.meta.title, section_class(Section::Article), content)
}

pub fn render_about(site: &SiteContext, doc: &RenderedDocument) -> Markup {
    let content = html! {
        article.about {
            h1 { (doc.meta.title) }
            (PreEscaped(&doc.html))
        }
    };
    base_document(site, &doc.meta.title, section_class(Section::About), content)
}

pub fn render_index(site: &SiteContext, doc: &RenderedDocument) -> Markup {
    let content = html! {
        section.intro {
            h1 { (doc.meta.title) }
            (PreEscaped(&doc.html))
        }
    };
    base_document(site, &site.title, section_class(Section::Index), content)
}

/// Articles newest first, as given.
pub fn render_timeline(site: &SiteContext, items: &[TimelineItem]) -> Markup {
    let content = html! {
        h1 { "Timeline" }
        @if items.is_empty() {
            p.empty { "Nothing published yet." }
        } @else {
            ol.timeline {
                @for item in items {
                    li {
                        (date_line(item.date))
                        " "
                        a href=(item.url) { (item.title) }
                    }
                }
            }
        }
    };
    base_document(site, "Timeline", section_class(Section::Timeline), content)
}

pub fn render_archive(site: &SiteContext, tree: &ArchiveTree) -> Markup {
    let content = html! {
        h1 { "Archive" }
        @if tree.is_empty() {
            p.empty { "Nothing published yet." }
        } @else {
            div.archive { (render_entries(&tree.root, 2)) }
        }
    };
    base_document(site, "Archive", section_class(Section::Archive), content)
}

fn render_entries(topic: &Topic, depth: u8) -> Markup {
    html! {
        @for entry in &topic.entries {
            @match entry {
                TopicEntry::Pages(pages) => {
                    ul.pages {
                        @for page in pages {
                            li { a href=(page.url) { (page.title) } }
                        }
                    }
                }
                TopicEntry::Topic(child) => {
                    section.topic {
                        (topic_heading(depth, &child.name))
                        (render_entries(child, depth.saturating_add(1)))
                    }
                }
            }
        }
    }
}

fn topic_heading(depth: u8, name: &str) -> Markup {
    match depth {
        0..=2 => html! { h2 { (name) } },
        3 => html! { h3 { (name) } },
        _ => html! { h4 { (name) } },
    }
}

// ============================================================================
// Tests
// ============================================================================
