//! Persisted archive ordering.
//!
//! The archive tree of the last successful build is stored as XML under the
//! state directory and read back at the start of the next build:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <archive version="1">
//!   <topic name="rust">
//!     <page title="Ownership" path="rust/ownership.md" url="/article/ownership.html"/>
//!     <topic name="async">
//!       <page title="Pinning" path="rust/async/pin.md" url="/article/pin.html"/>
//!     </topic>
//!   </topic>
//! </archive>
//! ```
//!
//! `path` is the join key between builds. `title` and `url` are informational
//! and refreshed from the current build on every save.
//!
//! Losing history only costs ordering stability, so [`ArchiveStateStore::load`]
//! never fails: a missing, unreadable, corrupt or foreign-version file yields
//! an empty tree. Saves go through a temporary file in the same directory that
//! is renamed over the snapshot, so a crash never leaves a half-written file.

use crate::archive::{ArchiveTree, ArchivedPage, Topic, TopicEntry};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// File name of the snapshot inside the state directory.
pub const SNAPSHOT_FILE: &str = "archive.xml";

/// Format version written to and expected on the root element.
pub const SNAPSHOT_VERSION: &str = "1";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed archive snapshot: {0}")]
    Malformed(String),
    #[error("unsupported archive snapshot version `{0}`")]
    Version(String),
}

/// Reads and writes the archive snapshot at `<state_dir>/archive.xml`.
#[derive(Debug, Clone)]
pub struct ArchiveStateStore {
    path: PathBuf,
}

impl ArchiveStateStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(SNAPSHOT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous tree, degrading to an empty one on any failure.
    pub fn load(&self) -> ArchiveTree {
        match self.try_load() {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Archive snapshot unusable, starting with empty history"
                );
                ArchiveTree::default()
            }
        }
    }

    /// Load the previous tree. A missing file is an empty history, not an error.
    pub fn try_load(&self) -> Result<ArchiveTree, StateError> {
        let xml = match fs::read_to_string(&self.path) {
            Ok(xml) => xml,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No archive snapshot yet");
                return Ok(ArchiveTree::default());
            }
            Err(e) => return Err(e.into()),
        };
        let tree = from_xml(&xml)?;
        tracing::debug!(pages = tree.len(), "Loaded archive snapshot");
        Ok(tree)
    }

    /// Replace the snapshot with `tree`.
    pub fn save(&self, tree: &ArchiveTree) -> Result<(), StateError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;

        let xml = to_xml(tree)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(xml.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(path = %self.path.display(), pages = tree.len(), "Saved archive snapshot");
        Ok(())
    }
}

// =============================================================================
// Serialization
// =============================================================================

pub fn to_xml(tree: &ArchiveTree) -> Result<String, StateError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("archive");
    root.push_attribute(("version", SNAPSHOT_VERSION));
    writer.write_event(Event::Start(root))?;
    write_entries(&mut writer, &tree.root.entries)?;
    writer.write_event(Event::End(BytesEnd::new("archive")))?;

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| StateError::Malformed(e.to_string()))
}

fn write_entries(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    entries: &[TopicEntry],
) -> Result<(), StateError> {
    for entry in entries {
        match entry {
            TopicEntry::Topic(topic) => {
                let mut start = BytesStart::new("topic");
                start.push_attribute(("name", topic.name.as_str()));
                writer.write_event(Event::Start(start))?;
                write_entries(writer, &topic.entries)?;
                writer.write_event(Event::End(BytesEnd::new("topic")))?;
            }
            TopicEntry::Pages(pages) => {
                for page in pages {
                    let mut elem = BytesStart::new("page");
                    elem.push_attribute(("title", page.title.as_str()));
                    elem.push_attribute(("path", page.path.as_str()));
                    elem.push_attribute(("url", page.url.as_str()));
                    writer.write_event(Event::Empty(elem))?;
                }
            }
        }
    }
    Ok(())
}

pub fn from_xml(xml: &str) -> Result<ArchiveTree, StateError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // stack[0] is the root once <archive> has been seen.
    let mut stack: Vec<Topic> = Vec::new();
    let mut root: Option<Topic> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"archive" if stack.is_empty() && root.is_none() => {
                    check_version(&e)?;
                    stack.push(Topic::default());
                }
                b"topic" if !stack.is_empty() => stack.push(Topic::new(attribute(&e, "name")?)),
                other => return Err(unexpected(other)),
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"archive" if stack.is_empty() && root.is_none() => {
                    check_version(&e)?;
                    root = Some(Topic::default());
                }
                b"topic" if !stack.is_empty() => {
                    let topic = Topic::new(attribute(&e, "name")?);
                    current(&mut stack)?.entries.push(TopicEntry::Topic(topic));
                }
                b"page" if !stack.is_empty() => {
                    let page = ArchivedPage {
                        title: attribute(&e, "title")?,
                        path: attribute(&e, "path")?,
                        url: attribute(&e, "url")?,
                    };
                    current(&mut stack)?.push_page(page);
                }
                other => return Err(unexpected(other)),
            },
            Event::End(_) => {
                let done = stack
                    .pop()
                    .ok_or_else(|| StateError::Malformed("unbalanced closing tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => parent.entries.push(TopicEntry::Topic(done)),
                    None => root = Some(done),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(StateError::Malformed("unterminated element".into()));
    }
    root.map(|root| ArchiveTree { root })
        .ok_or_else(|| StateError::Malformed("missing <archive> root".into()))
}

fn current(stack: &mut [Topic]) -> Result<&mut Topic, StateError> {
    stack
        .last_mut()
        .ok_or_else(|| StateError::Malformed("element outside <archive>".into()))
}

fn check_version(e: &BytesStart<'_>) -> Result<(), StateError> {
    let version = attribute(e, "version")?;
    if version != SNAPSHOT_VERSION {
        return Err(StateError::Version(version));
    }
    Ok(())
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<String, StateError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() != name.as_bytes() {
            continue;
        }
        let raw = std::str::from_utf8(&attr.value)
            .map_err(|e| StateError::Malformed(format!("attribute `{name}`: {e}")))?;
        let value = unescape(raw).map_err(quick_xml::Error::from)?;
        return Ok(value.into_owned());
    }
    Err(StateError::Malformed(format!(
        "<{}> is missing attribute `{name}`",
        String::from_utf8_lossy(e.name().as_ref())
    )))
}

fn unexpected(tag: &[u8]) -> StateError {
    StateError::Malformed(format!(
        "unexpected element <{}>",
        String::from_utf8_lossy(tag)
    ))
}
