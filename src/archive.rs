//! History-stable archive ordering.
//!
//! The archive page groups articles into topics derived from their source
//! directories. Rebuilding must not reshuffle it: an article keeps its place
//! relative to the articles it was published alongside, and new articles are
//! appended after everything already known.
//!
//! The only state carried between builds is the previous [`ArchiveTree`],
//! persisted by [`crate::state`]. Its pages are keyed by source path
//! (relative to the article directory), which survives title and URL changes.
//!
//! ## Algorithm
//!
//! ```text
//! current articles ──sort by date──▶ fallback order
//! previous tree ──flatten (DFS)──▶ history order
//!
//! merged = [history paths still present] ++ [remaining, in fallback order]
//!
//! common dir prefix ─▶ strip ─▶ topics / leaf ─▶ ArchiveTree
//! ```
//!
//! Topic order at every level is the order of first appearance in the merged
//! sequence, so it is as stable as the sequence itself.
//!
//! ## Shape
//!
//! A topic holds an ordered list of [`TopicEntry`]s. Pages sitting directly in
//! a topic form a single [`TopicEntry::Pages`] run placed where the first of
//! them appeared; sub-topics are [`TopicEntry::Topic`]s.
//!
//! Directories are taken relative to the content root, so every path starts
//! with the `article` segment. When some article's directory is the common
//! prefix itself, the prefix is moved one level up: every page then sits
//! under a named topic, and articles at the top of `article/` land in an
//! `article` topic.
//!
//! ## Ordered paths
//!
//! The tree's depth-first order ([`ArchiveTree::paths`]) is the merged
//! ordering carried to the next build. Grouping a topic's direct pages into
//! one run can move them ahead of a sibling sub-topic, so the raw merge
//! sequence is internal and only the tree's order is exposed.

use crate::types::DocumentKind;
use chrono::NaiveDate;
use std::collections::HashMap;

/// A current article as seen by the archive stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Source path relative to the article directory, `/`-separated.
    pub path: String,
    pub title: String,
    pub url: String,
    pub date: NaiveDate,
}

/// A leaf of the archive tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedPage {
    pub path: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicEntry {
    Topic(Topic),
    Pages(Vec<ArchivedPage>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Topic {
    pub name: String,
    pub entries: Vec<TopicEntry>,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Sub-topics in order.
    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.entries.iter().filter_map(|e| match e {
            TopicEntry::Topic(t) => Some(t),
            TopicEntry::Pages(_) => None,
        })
    }

    /// Pages sitting directly in this topic, in order.
    pub fn pages(&self) -> impl Iterator<Item = &ArchivedPage> {
        self.entries.iter().flat_map(|e| match e {
            TopicEntry::Pages(pages) => pages.as_slice(),
            TopicEntry::Topic(_) => &[][..],
        })
    }

    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics().find(|t| t.name == name)
    }

    fn topic_mut(&mut self, name: &str) -> &mut Topic {
        let position = self
            .entries
            .iter()
            .position(|e| matches!(e, TopicEntry::Topic(t) if t.name == name));
        let index = position.unwrap_or_else(|| {
            self.entries.push(TopicEntry::Topic(Topic::new(name)));
            self.entries.len() - 1
        });
        match &mut self.entries[index] {
            TopicEntry::Topic(topic) => topic,
            TopicEntry::Pages(_) => unreachable!("index points at a topic entry"),
        }
    }

    pub(crate) fn push_page(&mut self, page: ArchivedPage) {
        let existing = self.entries.iter_mut().find_map(|e| match e {
            TopicEntry::Pages(pages) => Some(pages),
            TopicEntry::Topic(_) => None,
        });
        match existing {
            Some(pages) => pages.push(page),
            None => self.entries.push(TopicEntry::Pages(vec![page])),
        }
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a ArchivedPage>) {
        for entry in &self.entries {
            match entry {
                TopicEntry::Topic(topic) => topic.collect(out),
                TopicEntry::Pages(pages) => out.extend(pages),
            }
        }
    }
}

/// Ordered topic hierarchy rendered on the archive page and persisted as the
/// ordering snapshot for the next build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveTree {
    pub root: Topic,
}

impl ArchiveTree {
    pub fn is_empty(&self) -> bool {
        self.root.entries.is_empty()
    }

    /// Every page in document order (depth-first, stored order).
    pub fn flatten(&self) -> Vec<&ArchivedPage> {
        let mut out = Vec::new();
        self.root.collect(&mut out);
        out
    }

    /// Source paths in document order; the ordering the next build inherits.
    pub fn paths(&self) -> Vec<&str> {
        self.flatten().into_iter().map(|p| p.path.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.flatten().len()
    }
}

/// Merge current articles with the previous ordering and build the new tree.
///
/// Rebuilding from the returned tree with the same articles yields the same
/// tree and the same [`ArchiveTree::paths`].
pub fn build_archive(entries: &[ArchiveEntry], history: &ArchiveTree) -> ArchiveTree {
    let ordered = merge_order(entries, history);
    build_tree(&ordered)
}

/// Current articles ordered by history first, then oldest-first.
///
/// Paths in `history` that no longer exist are dropped.
fn merge_order<'a>(entries: &'a [ArchiveEntry], history: &ArchiveTree) -> Vec<&'a ArchiveEntry> {
    let mut fallback: Vec<&ArchiveEntry> = entries.iter().collect();
    fallback.sort_by_key(|e| e.date);

    let mut remaining: HashMap<&str, &ArchiveEntry> =
        entries.iter().map(|e| (e.path.as_str(), e)).collect();

    let mut ordered = Vec::with_capacity(entries.len());
    for path in history.paths() {
        if let Some(entry) = remaining.remove(path) {
            ordered.push(entry);
        }
    }
    ordered.extend(
        fallback
            .into_iter()
            .filter(|e| remaining.contains_key(e.path.as_str())),
    );
    ordered
}

/// Group an ordered article sequence into topics.
pub fn build_tree(ordered: &[&ArchiveEntry]) -> ArchiveTree {
    let mut tree = ArchiveTree::default();
    if ordered.is_empty() {
        return tree;
    }
    let root_topic = DocumentKind::Article.dir_name();

    let split: Vec<(Vec<&str>, &ArchiveEntry)> = ordered
        .iter()
        .map(|entry| {
            let mut segments: Vec<&str> = std::iter::once(root_topic)
                .chain(entry.path.split('/'))
                .collect();
            segments.pop();
            (segments, *entry)
        })
        .collect();

    let dirs: Vec<&[&str]> = split.iter().map(|(dirs, _)| dirs.as_slice()).collect();
    let prefix = topic_prefix_len(&dirs);

    for (dirs, entry) in &split {
        let mut node = &mut tree.root;
        for segment in &dirs[prefix..] {
            node = node.topic_mut(segment);
        }
        node.push_page(ArchivedPage {
            path: entry.path.clone(),
            title: entry.title.clone(),
            url: entry.url.clone(),
        });
    }
    tree
}

/// Number of leading directory segments shared by every article, minus one
/// when some article's directory is exactly that prefix and would otherwise
/// be left without a topic.
fn topic_prefix_len(dirs: &[&[&str]]) -> usize {
    let Some((first, rest)) = dirs.split_first() else {
        return 0;
    };
    let common = rest.iter().fold(first.len(), |len, dir| {
        first[..len]
            .iter()
            .zip(dir.iter())
            .take_while(|(a, b)| a == b)
            .count()
    });
    if common > 0 && dirs.iter().any(|dir| dir.len() == common) {
        common - 1
    } else {
        common
    }
}
