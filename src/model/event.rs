//! Sides of a synchronized pair and the change events observed on them.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two synchronized roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The Markdown tree.
    Source,
    /// The notebook tree.
    Target,
}

impl Side {
    /// Both sides, source first.
    pub const BOTH: [Side; 2] = [Side::Source, Side::Target];

    /// Returns the other side.
    pub fn counterpart(self) -> Side {
        match self {
            Side::Source => Side::Target,
            Side::Target => Side::Source,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "md"),
            Side::Target => write!(f, "ipynb"),
        }
    }
}

/// Kind of filesystem mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
    /// The path is the destination of a rename.
    Moved,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Moved => "moved",
        }
    }
}

/// A debounced change to one path below a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Root the change happened under.
    pub root: Side,
    /// Path relative to that root.
    pub path: PathBuf,
    pub kind: ChangeKind,
    /// Modification time of the path when the event was emitted, or the
    /// emission time for deletions.
    pub observed: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(root: Side, path: impl Into<PathBuf>, kind: ChangeKind, observed: DateTime<Utc>) -> Self {
        Self {
            root,
            path: path.into(),
            kind,
            observed,
        }
    }
}
