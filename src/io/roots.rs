//! The pair of synchronized directory roots.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::model::{DocumentKey, DocumentKind, Side};

/// Source and target roots plus the document extension on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Extension of source documents, without the dot.
    pub source_ext: String,
    /// Extension of target documents, without the dot.
    pub target_ext: String,
}

impl Roots {
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        source_ext: &str,
        target_ext: &str,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_ext: source_ext.to_string(),
            target_ext: target_ext.to_string(),
        }
    }

    pub fn root(&self, side: Side) -> &Path {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    pub fn extension(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.source_ext,
            Side::Target => &self.target_ext,
        }
    }

    /// Path of `key` below the root of `side`.
    pub fn path_for(&self, key: &DocumentKey, side: Side) -> PathBuf {
        let base = self.root(side).join(&key.stem);
        match key.kind {
            DocumentKind::Directory => base,
            DocumentKind::File => {
                let mut name = OsString::from(base);
                name.push(".");
                name.push(self.extension(side));
                PathBuf::from(name)
            }
        }
    }

    /// Path of `absolute` relative to the root of `side`.
    pub fn relative<'a>(&self, side: Side, absolute: &'a Path) -> Option<&'a Path> {
        absolute.strip_prefix(self.root(side)).ok()
    }

    /// Maps a relative path on `side` to its document key.
    ///
    /// Files without the side's extension are not documents. The extension
    /// must match exactly, since [`Roots::path_for`] rebuilds it as configured.
    pub fn classify(&self, side: Side, rel: &Path, is_dir: bool) -> Option<DocumentKey> {
        if rel.as_os_str().is_empty() {
            return None;
        }
        if is_dir {
            return Some(DocumentKey::directory(rel));
        }
        let ext = rel.extension()?.to_str()?;
        if ext != self.extension(side) {
            return None;
        }
        let stem = rel.with_extension("");
        if stem.file_name().is_none() {
            return None;
        }
        Some(DocumentKey::file(stem))
    }

    /// True if a file at `rel` on `side` would be a document.
    pub fn is_document(&self, side: Side, rel: &Path) -> bool {
        self.classify(side, rel, false).is_some()
    }
}
