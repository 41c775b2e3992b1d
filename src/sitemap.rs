//! Sitemap generation.
//!
//! Lists every generated page for search engine indexing. Only written when
//! `site.domain` is configured, since sitemap locations must be absolute.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://blog.example.com/article/ownership.html</loc>
//!     <lastmod>2021-03-01</lastmod>
//!   </url>
//! </urlset>
//! ```
//!
//! Articles carry their metadata date as `lastmod`; other pages have none.

use crate::types::{Page, PageId};
use chrono::NaiveDate;
use quick_xml::escape::escape;
use std::collections::HashMap;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Output file name, relative to the output root.
pub const SITEMAP_FILE: &str = "sitemap.xml";

/// Single URL entry in the sitemap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
}

#[derive(Debug, Default)]
pub struct Sitemap {
    urls: Vec<UrlEntry>,
}

impl Sitemap {
    /// One entry per page, in page order.
    pub fn from_pages(domain: &str, pages: &[Page], dates: &HashMap<PageId, NaiveDate>) -> Self {
        let base = base_url(domain);
        let urls = pages
            .iter()
            .map(|page| UrlEntry {
                loc: format!("{base}{}", page.url()),
                lastmod: dates.get(&page.id).copied(),
            })
            .collect();
        Self { urls }
    }

    pub fn urls(&self) -> &[UrlEntry] {
        &self.urls
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.urls.len() * 96);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in &self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape(entry.loc.as_str())));
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod.format("%Y-%m-%d")));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

/// `https://<domain>` without a trailing slash. A scheme in the configured
/// domain is kept.
fn base_url(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::date;

    fn page(id: usize, path: &str) -> Page {
        Page {
            id: PageId(id),
            output_path: path.to_string(),
            content: String::new(),
        }
    }

    #[test]
    fn every_page_listed_with_absolute_url() {
        let pages = vec![page(0, "article/x.html"), page(1, "index.html")];
        let sitemap = Sitemap::from_pages("blog.example.com", &pages, &HashMap::new());
        let locs: Vec<&str> = sitemap.urls().iter().map(|u| u.loc.as_str()).collect();
        assert_eq!(
            locs,
            vec![
                "https://blog.example.com/article/x.html",
                "https://blog.example.com/index.html",
            ]
        );
    }

    #[test]
    fn articles_carry_lastmod() {
        let pages = vec![page(0, "article/x.html"), page(1, "index.html")];
        let dates = HashMap::from([(PageId(0), date(2021, 3, 1))]);
        let xml = Sitemap::from_pages("blog.example.com", &pages, &dates).to_xml();
        assert!(xml.contains("<lastmod>2021-03-01</lastmod>"));
        assert_eq!(xml.matches("<lastmod>").count(), 1);
    }

    #[test]
    fn xml_structure() {
        let xml = Sitemap::from_pages("blog.example.com", &[page(0, "a.html")], &HashMap::new())
            .to_xml();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>https://blog.example.com/a.html</loc>"));
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn locations_are_escaped() {
        let xml = Sitemap::from_pages("example.com", &[page(0, "a&b.html")], &HashMap::new())
            .to_xml();
        assert!(xml.contains("<loc>https://example.com/a&amp;b.html</loc>"));
    }

    #[test]
    fn explicit_scheme_and_trailing_slash() {
        assert_eq!(base_url("http://example.com/"), "http://example.com");
        assert_eq!(base_url("example.com"), "https://example.com");
    }
}
