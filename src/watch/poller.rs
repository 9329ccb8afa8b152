//! Change detection by comparing successive snapshots of a root.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::io::Stat;
use crate::model::ChangeKind;

pub(super) type Snapshot = BTreeMap<PathBuf, Stat>;

/// Differences between two snapshots of the same root.
///
/// Directory modification times are ignored; they change whenever a child
/// does and carry no content of their own.
pub(super) fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<(PathBuf, ChangeKind)> {
    let mut changes = Vec::new();

    for (path, stat) in current {
        match previous.get(path) {
            None => changes.push((path.clone(), ChangeKind::Created)),
            Some(old) if old.is_dir != stat.is_dir => {
                changes.push((path.clone(), ChangeKind::Created))
            }
            Some(old) if !stat.is_dir && (old.mtime != stat.mtime || old.size != stat.size) => {
                changes.push((path.clone(), ChangeKind::Modified))
            }
            Some(_) => {}
        }
    }

    for path in previous.keys() {
        if !current.contains_key(path) {
            changes.push((path.clone(), ChangeKind::Deleted));
        }
    }

    changes
}
