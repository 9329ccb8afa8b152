//! Logical documents tracked by the orchestrator.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::event::Side;
use crate::config::ConflictStrategy;

/// Whether a logical document is a file pair or a mirrored directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    File,
    Directory,
}

/// Identity of a logical document: relative path without extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    pub stem: PathBuf,
    pub kind: DocumentKind,
}

impl DocumentKey {
    pub fn file(stem: impl Into<PathBuf>) -> Self {
        Self {
            stem: stem.into(),
            kind: DocumentKind::File,
        }
    }

    pub fn directory(stem: impl Into<PathBuf>) -> Self {
        Self {
            stem: stem.into(),
            kind: DocumentKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == DocumentKind::Directory
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DocumentKind::File => write!(f, "{}", self.stem.display()),
            DocumentKind::Directory => write!(f, "{}/", self.stem.display()),
        }
    }
}

/// Synchronization state of a logical document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocState {
    /// Seen, but the two sides are not known to agree.
    Unsynced,
    /// An action for this document is in flight.
    Syncing,
    Synced,
    /// Both sides changed; a resolution is being applied.
    Conflict,
    /// One side is gone and deletion is not propagated.
    Orphaned,
}

impl fmt::Display for DocState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocState::Unsynced => "unsynced",
            DocState::Syncing => "syncing",
            DocState::Synced => "synced",
            DocState::Conflict => "conflict",
            DocState::Orphaned => "orphaned",
        };
        f.write_str(name)
    }
}

/// What is known about one side of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideRecord {
    /// Whether the path currently exists.
    pub present: bool,
    /// Modification time at the last successful sync.
    pub synced_mtime: Option<DateTime<Utc>>,
    /// Content hash at the last successful sync, when it was computed.
    pub synced_hash: Option<String>,
    /// Most recently observed modification time.
    pub seen_mtime: Option<DateTime<Utc>>,
}

impl SideRecord {
    /// A side observed on disk but never synchronized.
    pub fn seen(mtime: DateTime<Utc>) -> Self {
        Self {
            present: true,
            synced_mtime: None,
            synced_hash: None,
            seen_mtime: Some(mtime),
        }
    }

    /// Marks this side as synchronized at `mtime`.
    pub fn mark_synced(&mut self, mtime: DateTime<Utc>, hash: Option<String>) {
        self.present = true;
        self.synced_mtime = Some(mtime);
        self.synced_hash = hash;
        self.seen_mtime = Some(mtime);
    }

    /// Forgets this side after a deletion.
    pub fn clear(&mut self) {
        *self = SideRecord::default();
    }
}

/// The outcome of a conflict decision, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub winner: Side,
    pub strategy: ConflictStrategy,
    pub source_mtime: Option<DateTime<Utc>>,
    pub target_mtime: Option<DateTime<Utc>>,
}

/// The unit of correspondence between the two trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalDocument {
    pub key: DocumentKey,
    pub state: DocState,
    pub source: SideRecord,
    pub target: SideRecord,
    pub last_resolution: Option<Resolution>,
}

impl LogicalDocument {
    /// Creates an unsynced document with neither side known.
    pub fn new(key: DocumentKey) -> Self {
        Self {
            key,
            state: DocState::Unsynced,
            source: SideRecord::default(),
            target: SideRecord::default(),
            last_resolution: None,
        }
    }

    pub fn side(&self, side: Side) -> &SideRecord {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideRecord {
        match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        }
    }

    /// True when neither side exists any more.
    pub fn is_gone(&self) -> bool {
        !self.source.present && !self.target.present
    }

    /// The only present side, if exactly one exists.
    pub fn lone_side(&self) -> Option<Side> {
        match (self.source.present, self.target.present) {
            (true, false) => Some(Side::Source),
            (false, true) => Some(Side::Target),
            _ => None,
        }
    }
}
