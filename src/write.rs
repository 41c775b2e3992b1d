//! Output writers.
//!
//! Stage 4 of the build pipeline. Everything lands under the output root:
//!
//! - **OutputCleaner**: empties the output root before writing, keeping
//!   hidden entries such as `.git` so a deploy checkout survives rebuilds
//! - **PageWriter**: writes each page to `<output>/<output_path>`
//! - **StaticWriter**: copies `content/static/**` to `<output>/static/**`
//! - **CNAMEWriter**: writes `<output>/CNAME` when a domain is configured
//!
//! Page paths are checked before writing: a path that is absolute or climbs
//! out with `..` is refused.
//!
//! Cleaning is destructive, so [`check_output_location`] runs first and
//! refuses an output root that is, or contains, the content directory or the
//! archive snapshot. Paths are compared after resolving symlinks, so
//! `./content` and `content/` are the same directory.

use crate::types::{Document, Page};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directory under the output root that static assets are copied into.
pub const STATIC_DIR: &str = "static";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("cannot write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("refusing to write outside the output directory: {0}")]
    UnsafePath(String),
    #[error(
        "output directory {} contains {}; cleaning it would delete it",
        .output.display(),
        .other.display()
    )]
    OutputOverlap { output: PathBuf, other: PathBuf },
}

trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T, WriteError>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T, WriteError> {
        self.map_err(|source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Refuse an output root that is, or is an ancestor of, any `protected` path.
pub fn check_output_location(output: &Path, protected: &[&Path]) -> Result<(), WriteError> {
    let resolved_output = resolve(output)?;
    for other in protected {
        if resolve(other)?.starts_with(&resolved_output) {
            return Err(WriteError::OutputOverlap {
                output: output.to_path_buf(),
                other: other.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Absolute form of `path` with symlinks resolved as far as it exists.
fn resolve(path: &Path) -> Result<PathBuf, WriteError> {
    let absolute = std::path::absolute(path).at(path)?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return Ok(missing.iter().rev().fold(canonical, |acc, name| acc.join(name)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return Ok(absolute.clone()),
        }
    }
}

/// Remove every non-hidden entry of `output`, creating it if needed.
///
/// Returns the number of top-level entries removed.
pub fn clean_output(output: &Path) -> Result<usize, WriteError> {
    if !output.exists() {
        fs::create_dir_all(output).at(output)?;
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(output).at(output)? {
        let entry = entry.at(output)?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if entry.file_type().at(&path)?.is_dir() {
            fs::remove_dir_all(&path).at(&path)?;
        } else {
            fs::remove_file(&path).at(&path)?;
        }
        removed += 1;
    }
    tracing::debug!(removed, output = %output.display(), "Cleaned output directory");
    Ok(removed)
}

/// Write `contents` to `output/relative`, creating parent directories.
pub fn write_file(output: &Path, relative: &str, contents: &str) -> Result<PathBuf, WriteError> {
    let target = output.join(safe_relative(relative)?);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    fs::write(&target, contents).at(&target)?;
    Ok(target)
}

pub fn write_pages(output: &Path, pages: &[Page]) -> Result<usize, WriteError> {
    for page in pages {
        write_file(output, &page.output_path, &page.content)?;
    }
    tracing::debug!(count = pages.len(), "Wrote pages");
    Ok(pages.len())
}

/// Copy static assets to `<output>/static/`, keeping their relative layout.
pub fn copy_statics(output: &Path, statics: &[Document]) -> Result<usize, WriteError> {
    let static_root = output.join(STATIC_DIR);
    for doc in statics {
        let target = static_root.join(&doc.relative_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        fs::copy(&doc.source_path, &target).at(&doc.source_path)?;
    }
    tracing::debug!(count = statics.len(), "Copied static files");
    Ok(statics.len())
}

/// Write the `CNAME` file used by static hosts to bind a custom domain.
pub fn write_cname(output: &Path, domain: &str) -> Result<PathBuf, WriteError> {
    write_file(output, "CNAME", &format!("{}\n", domain.trim()))
}

fn safe_relative(relative: &str) -> Result<&Path, WriteError> {
    let path = Path::new(relative);
    let safe = !relative.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(path)
    } else {
        Err(WriteError::UnsafePath(relative.to_string()))
    }
}
