//! Tree scanning and consistency checking.
//!
//! Walks both roots, pairs up documents by key and classifies every pair as
//! in sync, stale on one side, or present on one side only.

mod ignore;

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use crate::config::SyncPolicy;
use crate::errors::Result;
use crate::io::{within_threshold, Roots, Stat};
use crate::model::{CorrespondenceTable, DocState, DocumentKey, LogicalDocument, Side, SideRecord};

pub use ignore::IgnoreSet;

/// A document that exists on one side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub key: DocumentKey,
    pub present: Side,
}

/// A pair whose modification times differ by more than the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalePair {
    pub key: DocumentKey,
    /// The older side.
    pub stale: Side,
    pub source_mtime: DateTime<Utc>,
    pub target_mtime: DateTime<Utc>,
}

/// Result of scanning both roots.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub table: CorrespondenceTable,
    pub discrepancies: Vec<Discrepancy>,
    pub stale: Vec<StalePair>,
    pub in_sync: usize,
}

impl ScanReport {
    /// True if every document has an up-to-date counterpart.
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty() && self.stale.is_empty()
    }
}

/// Lists every document path (files with the side's extension, and
/// directories) below the root of `side`, with its stat.
///
/// Ignored directories are not descended into. Entries that vanish while
/// walking are skipped.
pub fn snapshot(roots: &Roots, side: Side, ignore: &IgnoreSet) -> Result<BTreeMap<PathBuf, Stat>> {
    walk(roots, side, roots.root(side), ignore)
}

/// Like [`snapshot`], limited to the entries strictly below the directory
/// `rel` of `side`. Keys stay relative to the root.
pub fn snapshot_below(
    roots: &Roots,
    side: Side,
    rel: &Path,
    ignore: &IgnoreSet,
) -> Result<BTreeMap<PathBuf, Stat>> {
    walk(roots, side, &roots.root(side).join(rel), ignore)
}

fn walk(roots: &Roots, side: Side, start: &Path, ignore: &IgnoreSet) -> Result<BTreeMap<PathBuf, Stat>> {
    let root = roots.root(side);
    let mut entries = BTreeMap::new();

    let walker = WalkDir::new(start)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .map(|rel| !ignore.is_ignored(rel))
                .unwrap_or(false)
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_vanished(&err) => {
                tracing::debug!("entry vanished during scan: {}", err);
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let is_dir = entry.file_type().is_dir();
        if !is_dir && !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        if !is_dir && !roots.is_document(side, rel) {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => {
                let mtime = metadata.modified()?.into();
                entries.insert(
                    rel.to_path_buf(),
                    Stat {
                        mtime,
                        size: metadata.len(),
                        is_dir,
                    },
                );
            }
            Err(err) if is_vanished(&err) => continue,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(entries)
}

fn is_vanished(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|e| e.kind() == io::ErrorKind::NotFound)
        .unwrap_or(false)
}

fn keyed(roots: &Roots, side: Side, entries: BTreeMap<PathBuf, Stat>) -> BTreeMap<DocumentKey, Stat> {
    entries
        .into_iter()
        .filter_map(|(rel, stat)| {
            roots
                .classify(side, &rel, stat.is_dir)
                .map(|key| (key, stat))
        })
        .collect()
}

/// Scans both roots and builds the correspondence table.
pub fn scan(roots: &Roots, policy: &SyncPolicy) -> Result<ScanReport> {
    let source = keyed(roots, Side::Source, snapshot(roots, Side::Source, &policy.ignore)?);
    let target = keyed(roots, Side::Target, snapshot(roots, Side::Target, &policy.ignore)?);

    let keys: BTreeSet<&DocumentKey> = source.keys().chain(target.keys()).collect();
    let mut report = ScanReport::default();

    for key in keys {
        let mut doc = LogicalDocument::new(key.clone());

        match (source.get(key), target.get(key)) {
            (Some(s), Some(t)) => {
                if key.is_dir() || within_threshold(s.mtime, t.mtime, policy.time_threshold) {
                    doc.source.mark_synced(s.mtime, None);
                    doc.target.mark_synced(t.mtime, None);
                    doc.state = DocState::Synced;
                    report.in_sync += 1;
                } else {
                    let stale = if s.mtime < t.mtime {
                        Side::Source
                    } else {
                        Side::Target
                    };
                    tracing::info!(
                        document = %key,
                        stale = %stale,
                        source_mtime = %s.mtime,
                        target_mtime = %t.mtime,
                        "stale pair found"
                    );
                    doc.source = SideRecord::seen(s.mtime);
                    doc.target = SideRecord::seen(t.mtime);
                    report.stale.push(StalePair {
                        key: key.clone(),
                        stale,
                        source_mtime: s.mtime,
                        target_mtime: t.mtime,
                    });
                }
            }
            (Some(s), None) => {
                doc.source = SideRecord::seen(s.mtime);
                report.discrepancies.push(found_discrepancy(key, Side::Source));
            }
            (None, Some(t)) => {
                doc.target = SideRecord::seen(t.mtime);
                report.discrepancies.push(found_discrepancy(key, Side::Target));
            }
            (None, None) => continue,
        }

        report.table.insert(doc);
    }

    tracing::debug!(
        documents = report.table.len(),
        in_sync = report.in_sync,
        stale = report.stale.len(),
        discrepancies = report.discrepancies.len(),
        "scan complete"
    );
    Ok(report)
}

fn found_discrepancy(key: &DocumentKey, present: Side) -> Discrepancy {
    tracing::info!(document = %key, present = %present, "discrepancy found");
    Discrepancy {
        key: key.clone(),
        present,
    }
}

/// Relative path of a document key on `side`.
pub fn relative_path(roots: &Roots, key: &DocumentKey, side: Side) -> PathBuf {
    let full = roots.path_for(key, side);
    roots
        .relative(side, &full)
        .map(Path::to_path_buf)
        .unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, make_roots, md, nb, write_at};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_classifies() {
        let dir = tempdir().unwrap();
        let roots = make_roots(dir.path());

        write_at(&md(&roots, "same.md"), "a", at(0));
        write_at(&nb(&roots, "same.ipynb"), "{}", at(2));
        write_at(&md(&roots, "old.md"), "a", at(0));
        write_at(&nb(&roots, "old.ipynb"), "{}", at(10));
        write_at(&md(&roots, "sub/only.md"), "a", at(0));
        write_at(&nb(&roots, "lonely.ipynb"), "{}", at(0));
        write_at(&md(&roots, "notes.txt"), "not a document", at(0));
        write_at(&md(&roots, ".hidden/secret.md"), "a", at(0));

        let report = scan(&roots, &SyncPolicy {
            ignore: IgnoreSet::new(&[".*".to_string()]).unwrap(),
            ..SyncPolicy::default()
        })
        .unwrap();

        assert_eq!(report.in_sync, 1);
        assert_eq!(
            report.stale,
            vec![StalePair {
                key: DocumentKey::file("old"),
                stale: Side::Source,
                source_mtime: at(0),
                target_mtime: at(10),
            }]
        );

        let mut discrepancies: Vec<_> = report
            .discrepancies
            .iter()
            .map(|d| (d.key.to_string(), d.present))
            .collect();
        discrepancies.sort();
        assert_eq!(
            discrepancies,
            vec![
                ("lonely".to_string(), Side::Target),
                ("sub/".to_string(), Side::Source),
                ("sub/only".to_string(), Side::Source),
            ]
        );

        assert_eq!(
            report.table.get(&DocumentKey::file("same")).unwrap().state,
            DocState::Synced
        );
        assert!(report.table.get(&DocumentKey::file(".hidden/secret")).is_none());
        assert!(!report.is_consistent());
    }

    #[test]
    fn test_empty_roots_are_consistent() {
        let dir = tempdir().unwrap();
        let roots = make_roots(dir.path());
        let report = scan(&roots, &SyncPolicy::default()).unwrap();
        assert!(report.is_consistent());
        assert!(report.table.is_empty());
    }

    #[test]
    fn test_snapshot_skips_staging_files() {
        let dir = tempdir().unwrap();
        let roots = make_roots(dir.path());
        fs::write(md(&roots, ".nbsync-tmp-1-1"), "x").unwrap();
        write_at(&md(&roots, "a.md"), "x", at(0));

        let entries = snapshot(&roots, Side::Source, &IgnoreSet::default()).unwrap();
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec![Path::new("a.md")]);
    }

    #[test]
    fn test_snapshot_below_keeps_root_relative_keys() {
        let dir = tempdir().unwrap();
        let roots = make_roots(dir.path());
        write_at(&md(&roots, "top.md"), "x", at(0));
        write_at(&md(&roots, "b/x.md"), "x", at(0));
        write_at(&md(&roots, "b/c/y.md"), "x", at(0));
        write_at(&md(&roots, "b/.cache/z.md"), "x", at(0));

        let ignore = IgnoreSet::new(&[".*".to_string()]).unwrap();
        let entries = snapshot_below(&roots, Side::Source, Path::new("b"), &ignore).unwrap();
        assert_eq!(
            entries.keys().collect::<Vec<_>>(),
            vec![Path::new("b/c"), Path::new("b/c/y.md"), Path::new("b/x.md")]
        );
    }

    #[test]
    fn test_relative_path() {
        let roots = Roots::new("/md", "/nb", "md", "ipynb");
        assert_eq!(
            relative_path(&roots, &DocumentKey::file("a/b"), Side::Target),
            PathBuf::from("a/b.ipynb")
        );
    }
}
