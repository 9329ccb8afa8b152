//! Change event source.
//!
//! One task per root observes the filesystem, either through OS
//! notifications or by polling, debounces per path and sends
//! [`ChangeEvent`]s to a single channel consumed by the orchestrator.
//!
//! ```text
//! notify / poll → translate → Debouncer → ChangeEvent channel
//! ```

mod debouncer;
mod native;
mod poller;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::config::{SyncPolicy, WatchBackend};
use crate::errors::SyncError;
use crate::io::Roots;
use crate::model::{ChangeEvent, ChangeKind, Side};
use crate::scan::snapshot;

use debouncer::Debouncer;
use native::{translate, NativeWatcher};
use poller::Snapshot;

const IDLE: Duration = Duration::from_secs(3600);

/// Debounced change events from both roots.
pub struct ChangeEventSource {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

impl ChangeEventSource {
    /// Starts one watcher task per root. Must be called within a tokio runtime.
    pub fn spawn(roots: Arc<Roots>, policy: Arc<SyncPolicy>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();

        for side in Side::BOTH {
            let watcher = RootWatcher {
                side,
                roots: Arc::clone(&roots),
                policy: Arc::clone(&policy),
                tx: tx.clone(),
            };
            tasks.spawn(watcher.run(shutdown_rx.clone()));
        }

        Self {
            rx,
            shutdown,
            tasks,
        }
    }

    /// Waits for at least one event and returns everything queued.
    ///
    /// Returns `None` once both watcher tasks have stopped.
    pub async fn next_batch(&mut self) -> Option<Vec<ChangeEvent>> {
        let first = self.rx.recv().await?;
        let mut batch = vec![first];
        while let Ok(event) = self.rx.try_recv() {
            batch.push(event);
        }
        Some(batch)
    }

    /// Stops both watcher tasks and waits for them to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        while self.tasks.join_next().await.is_some() {}
        tracing::debug!("change event source stopped");
    }
}

enum Backend {
    Native(NativeWatcher),
    Poll {
        interval: tokio::time::Interval,
        previous: Snapshot,
    },
}

enum Raw {
    Changes(Vec<(PathBuf, ChangeKind)>),
    Failed(String),
}

struct RootWatcher {
    side: Side,
    roots: Arc<Roots>,
    policy: Arc<SyncPolicy>,
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

impl RootWatcher {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut backend = self.start_backend().await;
        let mut debouncer = Debouncer::new(self.policy.debounce);

        loop {
            let sleep = debouncer.sleep_duration(Instant::now()).unwrap_or(IDLE);

            tokio::select! {
                _ = shutdown.changed() => break,
                raw = self.next_raw(&mut backend) => match raw {
                    Raw::Changes(changes) => {
                        let now = Instant::now();
                        for (rel, kind) in changes {
                            if !rel.as_os_str().is_empty() && !self.policy.ignore.is_ignored(&rel) {
                                debouncer.push_at(rel, kind, now);
                            }
                        }
                    }
                    Raw::Failed(reason) => {
                        tracing::warn!(
                            root = %self.side,
                            reason = %reason,
                            "watch backend fallback: switching to polling"
                        );
                        backend = self.start_polling().await;
                    }
                },
                _ = tokio::time::sleep(sleep) => {
                    for (rel, kind) in debouncer.take_ready_at(Instant::now()) {
                        if let Some(event) = self.resolve(rel, kind) {
                            tracing::debug!(
                                root = %event.root,
                                path = %event.path.display(),
                                kind = event.kind.label(),
                                "change detected"
                            );
                            if self.tx.send(event).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
        tracing::debug!(root = %self.side, "watcher stopped");
    }

    fn root(&self) -> &Path {
        self.roots.root(self.side)
    }

    async fn start_backend(&self) -> Backend {
        if self.policy.backend(self.side) == WatchBackend::Native {
            match NativeWatcher::start(self.root(), self.policy.watch_interval) {
                Ok(native) => {
                    tracing::debug!(root = %self.side, "watching with native notifications");
                    return Backend::Native(native);
                }
                Err(err) => {
                    tracing::warn!(
                        root = %self.side,
                        reason = %err,
                        "watch backend fallback: switching to polling"
                    );
                }
            }
        }
        self.start_polling().await
    }

    async fn start_polling(&self) -> Backend {
        let previous = self.take_snapshot().await.unwrap_or_default();
        let mut interval = tokio::time::interval(self.policy.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the snapshot above covers it.
        interval.tick().await;
        tracing::debug!(
            root = %self.side,
            interval = ?self.policy.poll_interval,
            "watching by polling"
        );
        Backend::Poll { interval, previous }
    }

    async fn take_snapshot(&self) -> Option<Snapshot> {
        let roots = Arc::clone(&self.roots);
        let policy = Arc::clone(&self.policy);
        let side = self.side;

        match tokio::task::spawn_blocking(move || snapshot(&roots, side, &policy.ignore)).await {
            Ok(Ok(snapshot)) => Some(snapshot),
            Ok(Err(err)) => {
                tracing::warn!(root = %side, "poll scan failed: {}", err);
                None
            }
            Err(err) => {
                tracing::warn!(root = %side, "poll scan panicked: {}", err);
                None
            }
        }
    }

    async fn next_raw(&self, backend: &mut Backend) -> Raw {
        match backend {
            Backend::Native(native) => match native.rx.recv().await {
                Some(Ok(event)) => Raw::Changes(
                    translate(&event)
                        .into_iter()
                        .filter_map(|(path, kind)| {
                            self.roots
                                .relative(self.side, &path)
                                .map(|rel| (rel.to_path_buf(), kind))
                        })
                        .collect(),
                ),
                Some(Err(err)) => Raw::Failed(SyncError::from(err).to_string()),
                None => Raw::Failed("notification channel closed".to_string()),
            },
            Backend::Poll { interval, previous } => {
                interval.tick().await;
                match self.take_snapshot().await {
                    Some(current) => {
                        let changes = poller::diff(previous, &current);
                        *previous = current;
                        Raw::Changes(changes)
                    }
                    None => Raw::Changes(Vec::new()),
                }
            }
        }
    }

    /// Turns a debounced path into an event, checking what is on disk now.
    ///
    /// The recorded kind only matters for directories and renames; existence
    /// at emission time decides between deletion and change.
    fn resolve(&self, rel: PathBuf, kind: ChangeKind) -> Option<ChangeEvent> {
        let absolute = self.root().join(&rel);

        match fs::metadata(&absolute) {
            Ok(metadata) => {
                let observed = metadata.modified().ok()?.into();
                let kind = match kind {
                    ChangeKind::Deleted => ChangeKind::Created,
                    other => other,
                };
                if metadata.is_dir() {
                    if kind == ChangeKind::Modified {
                        return None;
                    }
                } else if !metadata.is_file() || !self.roots.is_document(self.side, &rel) {
                    return None;
                }
                Some(ChangeEvent::new(self.side, rel, kind, observed))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Some(ChangeEvent::new(
                self.side,
                rel,
                ChangeKind::Deleted,
                Utc::now(),
            )),
            Err(err) => {
                tracing::warn!(path = %absolute.display(), "cannot stat changed path: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_roots;
    use tempfile::tempdir;

    fn polling_policy() -> SyncPolicy {
        SyncPolicy {
            debounce: Duration::from_millis(50),
            poll_interval: Duration::from_millis(50),
            source_backend: WatchBackend::Poll,
            target_backend: WatchBackend::Poll,
            ..SyncPolicy::default()
        }
    }

    async fn collect_until<F>(source: &mut ChangeEventSource, mut done: F) -> Vec<ChangeEvent>
    where
        F: FnMut(&[ChangeEvent]) -> bool,
    {
        let mut events = Vec::new();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while !done(&events) {
            match tokio::time::timeout_at(deadline, source.next_batch()).await {
                Ok(Some(batch)) => events.extend(batch),
                _ => break,
            }
        }
        events
    }

    #[tokio::test]
    async fn test_polling_reports_create_and_delete() {
        let dir = tempdir().unwrap();
        let roots = Arc::new(make_roots(dir.path()));
        let mut source = ChangeEventSource::spawn(Arc::clone(&roots), Arc::new(polling_policy()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        let path = roots.source.join("a.md");
        fs::write(&path, "# a\n").unwrap();
        fs::write(roots.source.join("ignored.txt"), "x").unwrap();

        let events = collect_until(&mut source, |events| !events.is_empty()).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].root, Side::Source);
        assert_eq!(events[0].path, PathBuf::from("a.md"));
        assert_eq!(events[0].kind, ChangeKind::Created);

        fs::remove_file(&path).unwrap();
        let events = collect_until(&mut source, |events| !events.is_empty()).await;
        assert_eq!(events[0].kind, ChangeKind::Deleted);

        source.shutdown().await;
    }

    #[tokio::test]
    async fn test_resolve_checks_disk() {
        let dir = tempdir().unwrap();
        let roots = Arc::new(make_roots(dir.path()));
        fs::create_dir(roots.target.join("sub")).unwrap();
        fs::write(roots.target.join("x.ipynb"), "{}").unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let watcher = RootWatcher {
            side: Side::Target,
            roots: Arc::clone(&roots),
            policy: Arc::new(SyncPolicy::default()),
            tx,
        };

        let event = watcher.resolve("x.ipynb".into(), ChangeKind::Deleted).unwrap();
        assert_eq!(event.kind, ChangeKind::Created);

        let event = watcher.resolve("gone.ipynb".into(), ChangeKind::Modified).unwrap();
        assert_eq!(event.kind, ChangeKind::Deleted);

        assert!(watcher.resolve("sub".into(), ChangeKind::Modified).is_none());
        assert!(watcher.resolve("sub".into(), ChangeKind::Created).is_some());
    }
}
