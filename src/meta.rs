//! Leading metadata block extraction.
//!
//! Every markdown document starts with a block of `key: value` lines:
//!
//! ```text
//! title: Notes on Ownership
//! date: 14/03/2021
//! tags: rust
//!     borrowing
//!
//! The body starts after the first blank line.
//! ```
//!
//! ## Grammar
//!
//! - **Key line**: up to three leading spaces, a key made of `[A-Za-z0-9_-]`,
//!   a colon, then the value. Keys are case-insensitive and stored lowercased.
//! - **Continuation line**: four or more leading spaces and no key. The
//!   trimmed text becomes another value of the most recent key.
//! - **Terminator**: the first blank line ends the block and is consumed. The
//!   first line that is neither a key line nor a continuation also ends the
//!   block, but is left in the body.
//!
//! Repeated keys accumulate values instead of overwriting.
//!
//! ## Required fields
//!
//! [`require`] checks that `title` and `date` are present. The first value of
//! each is used; the date is parsed as `day/month/year`.

use crate::types::{DocumentMeta, Metadata};
use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// `chrono` format of the `date` field.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(?P<key>[A-Za-z0-9_-]+):\s*(?P<value>.*)$").expect("valid key regex")
});

static CONTINUATION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {4,}(?P<value>.*)$").expect("valid continuation regex"));

#[derive(Error, Debug, PartialEq)]
pub enum MalformedDocument {
    #[error("{}: missing required metadata field `{field}`", .path.display())]
    MissingField { field: &'static str, path: PathBuf },
    #[error("{}: cannot parse date `{value}` (expected day/month/year)", .path.display())]
    InvalidDate { value: String, path: PathBuf },
}

impl MalformedDocument {
    /// Name of the offending metadata field.
    pub fn field(&self) -> &'static str {
        match self {
            MalformedDocument::MissingField { field, .. } => *field,
            MalformedDocument::InvalidDate { .. } => "date",
        }
    }
}

/// Split `text` into its metadata block and the remaining body.
///
/// Never fails: a document without a metadata block yields empty metadata
/// and the full text as body.
pub fn parse(text: &str) -> (Metadata, &str) {
    let mut metadata = Metadata::new();
    let mut last_key: Option<String> = None;
    let mut consumed = 0;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);

        if content.trim().is_empty() {
            consumed += line.len();
            break;
        }

        if let Some(caps) = KEY_LINE.captures(content) {
            let key = caps["key"].to_lowercase();
            metadata
                .entry(key.clone())
                .or_default()
                .push(caps["value"].trim().to_string());
            last_key = Some(key);
        } else if let Some(key) = &last_key
            && let Some(caps) = CONTINUATION_LINE.captures(content)
        {
            metadata
                .entry(key.clone())
                .or_default()
                .push(caps["value"].trim().to_string());
        } else {
            break;
        }

        consumed += line.len();
    }

    (metadata, &text[consumed..])
}

/// Extract `title` and `date` from parsed metadata.
pub fn require(metadata: &Metadata, path: &Path) -> Result<DocumentMeta, MalformedDocument> {
    let first = |field: &'static str| {
        metadata
            .get(field)
            .and_then(|values| values.first())
            .ok_or_else(|| MalformedDocument::MissingField {
                field,
                path: path.to_path_buf(),
            })
    };

    let title = first("title")?.clone();
    let raw_date = first("date")?;
    let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|_| {
        MalformedDocument::InvalidDate {
            value: raw_date.clone(),
            path: path.to_path_buf(),
        }
    })?;

    Ok(DocumentMeta { title, date })
}
