//! Planned actions, their outcomes and run summaries.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::io::Roots;
use crate::model::{ChangeEvent, DocumentKey, Side};

/// What to do for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Convert the document on `from` and write its counterpart.
    Convert { from: Side },
    /// Delete the file on `side`.
    Delete { side: Side },
    /// Create the directory on `side`.
    CreateDir { side: Side },
    /// Remove the directory on `side` if it is empty.
    RemoveDir { side: Side },
}

/// Why an action was planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The counterpart does not exist.
    Missing,
    /// One side changed since the last sync.
    Edited,
    /// Both sides changed, or an unsynced pair differs.
    Conflict,
    /// One side was deleted.
    Deleted,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reason::Missing => "missing counterpart",
            Reason::Edited => "edited",
            Reason::Conflict => "conflict",
            Reason::Deleted => "deleted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub key: DocumentKey,
    pub action: SyncAction,
    pub reason: Reason,
}

impl PlannedAction {
    pub fn new(key: DocumentKey, action: SyncAction, reason: Reason) -> Self {
        Self {
            key,
            action,
            reason,
        }
    }

    /// Directory removals run after every other action of a batch.
    pub fn is_dir_removal(&self) -> bool {
        matches!(self.action, SyncAction::RemoveDir { .. })
    }

    /// One-line human-readable description.
    pub fn describe(&self, roots: &Roots) -> String {
        let path = |side| roots.path_for(&self.key, side).display().to_string();
        match self.action {
            SyncAction::Convert { from } => format!(
                "convert {} -> {} ({})",
                path(from),
                path(from.counterpart()),
                self.reason
            ),
            SyncAction::Delete { side } => format!("delete {} ({})", path(side), self.reason),
            SyncAction::CreateDir { side } => format!("mkdir {} ({})", path(side), self.reason),
            SyncAction::RemoveDir { side } => format!("rmdir {} ({})", path(side), self.reason),
        }
    }
}

/// The planned actions of one batch of events.
#[derive(Debug, Default)]
pub struct BatchPlan {
    pub actions: Vec<PlannedAction>,
    /// Events for documents that already have an action in flight.
    pub deferred: Vec<ChangeEvent>,
}

/// Result of executing a planned action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Converted {
        from: Side,
        from_mtime: DateTime<Utc>,
        from_hash: String,
        to_mtime: DateTime<Utc>,
        to_hash: String,
        /// False when the counterpart already had the converted content.
        wrote: bool,
        /// Set when the input could not be parsed.
        diagnostic: Option<String>,
    },
    Deleted {
        side: Side,
    },
    DirCreated {
        side: Side,
        mtime: DateTime<Utc>,
    },
    DirRemoved {
        side: Side,
        /// False when the directory was kept because it is not empty.
        removed: bool,
    },
    /// Nothing was done, for example because the input vanished.
    Skipped(String),
}

/// Counters over a run of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub written: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub directories: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SyncReport {
    pub fn record(&mut self, result: &crate::errors::Result<Outcome>) {
        match result {
            Ok(Outcome::Converted { wrote: true, .. }) => self.written += 1,
            Ok(Outcome::Converted { wrote: false, .. }) => self.unchanged += 1,
            Ok(Outcome::Deleted { .. }) => self.deleted += 1,
            Ok(Outcome::DirCreated { .. }) | Ok(Outcome::DirRemoved { .. }) => {
                self.directories += 1
            }
            Ok(Outcome::Skipped(_)) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }

    /// Number of filesystem mutations performed.
    pub fn writes(&self) -> usize {
        self.written + self.deleted + self.directories
    }

    pub fn merge(&mut self, other: &SyncReport) {
        self.written += other.written;
        self.unchanged += other.unchanged;
        self.deleted += other.deleted;
        self.directories += other.directories;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} unchanged, {} deleted, {} directories, {} skipped, {} failed",
            self.written, self.unchanged, self.deleted, self.directories, self.skipped, self.failed
        )
    }
}
