//! OS change notifications via `notify`, bridged into tokio.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::errors::Result;
use crate::model::ChangeKind;

/// A running native watcher and the receiving end of its event bridge.
pub(super) struct NativeWatcher {
    // Dropping the watcher stops notifications.
    _watcher: RecommendedWatcher,
    pub(super) rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl NativeWatcher {
    /// Starts watching `root` recursively.
    pub(super) fn start(root: &Path, latency: Duration) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default().with_poll_interval(latency),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }
}

/// Maps a notify event onto per-path change kinds.
///
/// Metadata-only notifications are dropped; they follow every write of an
/// mtime and carry no content change.
pub(super) fn translate(event: &Event) -> Vec<(PathBuf, ChangeKind)> {
    let all = |kind: ChangeKind| -> Vec<(PathBuf, ChangeKind)> {
        event.paths.iter().map(|p| (p.clone(), kind)).collect()
    };

    match event.kind {
        EventKind::Create(_) => all(ChangeKind::Created),
        EventKind::Remove(_) => all(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::Both if event.paths.len() == 2 => vec![
                (event.paths[0].clone(), ChangeKind::Deleted),
                (event.paths[1].clone(), ChangeKind::Moved),
            ],
            RenameMode::From => all(ChangeKind::Deleted),
            RenameMode::To => all(ChangeKind::Moved),
            _ => event
                .paths
                .iter()
                .map(|p| {
                    let kind = if p.exists() {
                        ChangeKind::Moved
                    } else {
                        ChangeKind::Deleted
                    };
                    (p.clone(), kind)
                })
                .collect(),
        },
        EventKind::Modify(_) => all(ChangeKind::Modified),
        _ => Vec::new(),
    }
}
