use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::model::ChangeKind;

#[derive(Debug, Clone, Copy)]
struct Pending {
    kind: ChangeKind,
    last_event: Instant,
}

/// Pure per-path debouncer: only handles timing and coalescing.
///
/// A path is released once it has been quiet for the delay. Events for the
/// same path coalesce, the latest kind winning, except that a modification
/// of a path created in the same window stays a creation.
pub(super) struct Debouncer {
    delay: Duration,
    pending: HashMap<PathBuf, Pending>,
}

impl Debouncer {
    pub(super) fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    pub(super) fn push_at(&mut self, path: PathBuf, kind: ChangeKind, now: Instant) {
        let kind = match (self.pending.get(&path).map(|p| p.kind), kind) {
            (Some(ChangeKind::Created), ChangeKind::Modified) => ChangeKind::Created,
            (_, kind) => kind,
        };
        self.pending.insert(
            path,
            Pending {
                kind,
                last_event: now,
            },
        );
    }

    /// Removes and returns every path that has been quiet for the delay.
    pub(super) fn take_ready_at(&mut self, now: Instant) -> Vec<(PathBuf, ChangeKind)> {
        let delay = self.delay;
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, p)| now.saturating_duration_since(p.last_event) >= delay)
            .map(|(path, _)| path.clone())
            .collect();

        let mut out: Vec<(PathBuf, ChangeKind)> = ready
            .into_iter()
            .filter_map(|path| self.pending.remove(&path).map(|p| (path, p.kind)))
            .collect();
        out.sort();
        out
    }

    /// Time until the next path becomes ready, or `None` if nothing is pending.
    pub(super) fn sleep_duration(&self, now: Instant) -> Option<Duration> {
        self.pending
            .values()
            .map(|p| self.delay.saturating_sub(now.saturating_duration_since(p.last_event)))
            .min()
            .map(|d| d.max(Duration::from_millis(1)))
    }

    pub(super) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
