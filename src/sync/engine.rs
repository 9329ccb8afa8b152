//! The correspondence table and its state machine.
//!
//! Planning is pure bookkeeping plus a few stats: it turns change events
//! into at most one [`PlannedAction`] per document. Executing the actions
//! is left to the [`Executor`]; outcomes are fed back through
//! [`SyncEngine::complete`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::SyncPolicy;
use crate::errors::Result;
use crate::io::{hexdigest_file, within_threshold, Roots, Stat};
use crate::model::{
    ChangeEvent, ChangeKind, CorrespondenceTable, DocState, DocumentKey, Side, SideRecord,
};
use crate::scan::{relative_path, snapshot_below, ScanReport};

use super::executor::Executor;
use super::plan::{BatchPlan, Outcome, PlannedAction, Reason, SyncAction};
use super::resolve::resolve;
use super::SyncReport;

/// Owns the correspondence table. Only the orchestrator loop touches it.
#[derive(Debug)]
pub struct SyncEngine {
    roots: Arc<Roots>,
    policy: Arc<SyncPolicy>,
    table: CorrespondenceTable,
    /// Documents with an action in flight, with the state to restore on failure.
    in_flight: HashMap<DocumentKey, DocState>,
}

impl SyncEngine {
    pub fn new(roots: Arc<Roots>, policy: Arc<SyncPolicy>, table: CorrespondenceTable) -> Self {
        Self {
            roots,
            policy,
            table,
            in_flight: HashMap::new(),
        }
    }

    /// Starts from the table built by a startup scan.
    pub fn from_scan(roots: Arc<Roots>, policy: Arc<SyncPolicy>, report: ScanReport) -> Self {
        Self::new(roots, policy, report.table)
    }

    pub fn table(&self) -> &CorrespondenceTable {
        &self.table
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    /// Number of documents with an action in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Plans one batch of events.
    ///
    /// Events for a document that already has an action planned or in
    /// flight are deferred and must be planned again after completion.
    pub fn plan_events(&mut self, events: Vec<ChangeEvent>) -> BatchPlan {
        let mut plan = BatchPlan::default();
        let events: Vec<ChangeEvent> = events
            .into_iter()
            .flat_map(|event| self.expand(event))
            .collect();

        for event in events {
            let Some(key) = self.locate(&event) else {
                tracing::trace!(path = %event.path.display(), "not a document");
                continue;
            };
            if self.in_flight.contains_key(&key) {
                plan.deferred.push(event);
                continue;
            }

            let prior = self
                .table
                .get(&key)
                .map(|doc| doc.state)
                .unwrap_or(DocState::Unsynced);

            let planned = match self.stat_side(&key, event.root) {
                Some(stat) => self.plan_present(&key, event.root, stat.mtime),
                None => self.plan_deleted(&key, event.root),
            };
            if let Some(action) = planned {
                self.begin(action.key.clone(), prior);
                plan.actions.push(action);
            }
        }

        plan
    }

    /// Plans actions for every unsynced document in the table.
    pub fn plan_reconcile(&mut self) -> Vec<PlannedAction> {
        let pending: Vec<DocumentKey> = self
            .table
            .iter()
            .filter(|doc| doc.state == DocState::Unsynced)
            .map(|doc| doc.key.clone())
            .filter(|key| !self.in_flight.contains_key(key))
            .collect();

        let mut actions = Vec::new();
        for key in pending {
            let Some(doc) = self.table.get(&key) else {
                continue;
            };

            let planned = match doc.lone_side() {
                Some(side) => self.plan_missing(&key, side),
                None => {
                    let (Some(source), Some(target)) =
                        (doc.source.seen_mtime, doc.target.seen_mtime)
                    else {
                        continue;
                    };
                    self.pair_decision(&key, source, target)
                }
            };
            if let Some(action) = planned {
                self.begin(action.key.clone(), DocState::Unsynced);
                actions.push(action);
            }
        }
        actions
    }

    /// Applies the outcome of a planned action to the table.
    pub fn complete(&mut self, planned: &PlannedAction, result: Result<Outcome>) {
        let key = &planned.key;
        let prior = self.in_flight.remove(key).unwrap_or(DocState::Unsynced);

        match result {
            Err(err) => {
                tracing::error!(document = %key, error = %err, "sync action failed");
                if let Some(doc) = self.table.get_mut(key) {
                    doc.state = prior;
                }
            }
            Ok(Outcome::Converted {
                from,
                from_mtime,
                from_hash,
                to_mtime,
                to_hash,
                wrote,
                ..
            }) => {
                let doc = self.table.get_or_insert(key);
                doc.side_mut(from).mark_synced(from_mtime, Some(from_hash));
                doc.side_mut(from.counterpart())
                    .mark_synced(to_mtime, Some(to_hash));
                doc.state = DocState::Synced;
                tracing::info!(
                    document = %key,
                    from = %from,
                    reason = %planned.reason,
                    wrote,
                    "document synced"
                );
            }
            Ok(Outcome::Deleted { side }) => {
                self.table.remove(key);
                tracing::info!(document = %key, side = %side, "counterpart deleted");
            }
            Ok(Outcome::DirCreated { side, mtime }) => {
                let doc = self.table.get_or_insert(key);
                let other = doc.side(side.counterpart()).seen_mtime.unwrap_or(mtime);
                doc.side_mut(side).mark_synced(mtime, None);
                doc.side_mut(side.counterpart()).mark_synced(other, None);
                doc.state = DocState::Synced;
                tracing::info!(document = %key, side = %side, "directory mirrored");
            }
            Ok(Outcome::DirRemoved { side, removed: true }) => {
                self.table.remove(key);
                tracing::info!(document = %key, side = %side, "directory removed");
            }
            Ok(Outcome::DirRemoved { side, removed: false }) => {
                if let Some(doc) = self.table.get_mut(key) {
                    doc.state = DocState::Orphaned;
                }
                tracing::info!(document = %key, side = %side, "directory not empty, kept");
            }
            Ok(Outcome::Skipped(reason)) => {
                tracing::debug!(document = %key, reason = %reason, "action skipped");
                if let Some(doc) = self.table.get_mut(key) {
                    doc.state = prior;
                }
            }
        }
    }

    /// Abandons a planned action without running it.
    pub fn abort(&mut self, key: &DocumentKey) {
        if let Some(prior) = self.in_flight.remove(key) {
            if let Some(doc) = self.table.get_mut(key) {
                doc.state = prior;
            }
        }
    }

    /// Forgets every orphaned document. Returns how many were dropped.
    pub fn prune_orphans(&mut self) -> usize {
        let orphans: Vec<DocumentKey> = self
            .table
            .iter()
            .filter(|doc| doc.state == DocState::Orphaned)
            .map(|doc| doc.key.clone())
            .collect();
        for key in &orphans {
            self.table.remove(key);
        }
        if !orphans.is_empty() {
            tracing::info!(count = orphans.len(), "orphans pruned");
        }
        orphans.len()
    }

    /// One blocking reconciliation pass over the whole table.
    pub fn reconcile(&mut self, executor: &Executor) -> SyncReport {
        let (actions, removals) = order_actions(self.plan_reconcile());
        let mut report = SyncReport::default();

        for planned in actions.iter().chain(removals.iter()) {
            let result = executor.run(planned);
            report.record(&result);
            self.complete(planned, result);
        }
        report
    }

    fn begin(&mut self, key: DocumentKey, prior: DocState) {
        if let Some(doc) = self.table.get_mut(&key) {
            doc.state = DocState::Syncing;
        }
        self.in_flight.insert(key, prior);
    }

    fn threshold(&self) -> Duration {
        self.policy.time_threshold
    }

    /// Maps an event onto a document key, looking at the disk.
    fn locate(&self, event: &ChangeEvent) -> Option<DocumentKey> {
        let absolute = self.roots.root(event.root).join(&event.path);
        match fs::metadata(&absolute) {
            Ok(metadata) => self
                .roots
                .classify(event.root, &event.path, metadata.is_dir()),
            Err(_) => {
                if self.roots.is_document(event.root, &event.path) {
                    self.roots.classify(event.root, &event.path, false)
                } else {
                    let key = DocumentKey::directory(&event.path);
                    self.table.contains(&key).then_some(key)
                }
            }
        }
    }

    /// A directory moved or copied into a root, or removed from it, is
    /// reported as a single event. Follows it with one event per document
    /// below the directory.
    fn expand(&self, event: ChangeEvent) -> Vec<ChangeEvent> {
        let absolute = self.roots.root(event.root).join(&event.path);
        let mut nested = Vec::new();

        if absolute.is_dir() {
            if matches!(event.kind, ChangeKind::Created | ChangeKind::Moved) {
                match snapshot_below(&self.roots, event.root, &event.path, &self.policy.ignore) {
                    Ok(entries) => nested.extend(entries.into_iter().map(|(rel, stat)| {
                        ChangeEvent::new(event.root, rel, ChangeKind::Created, stat.mtime)
                    })),
                    Err(err) => tracing::warn!(
                        path = %absolute.display(),
                        error = %err,
                        "cannot list moved directory"
                    ),
                }
            }
        } else if !absolute.exists() {
            let dir = DocumentKey::directory(&event.path);
            if self.table.contains(&dir) {
                nested.extend(
                    self.table
                        .iter()
                        .filter(|doc| doc.key != dir && doc.key.stem.starts_with(&dir.stem))
                        .filter(|doc| doc.side(event.root).present)
                        .map(|doc| {
                            ChangeEvent::new(
                                event.root,
                                relative_path(&self.roots, &doc.key, event.root),
                                ChangeKind::Deleted,
                                event.observed,
                            )
                        }),
                );
            }
        }

        if !nested.is_empty() {
            tracing::debug!(
                path = %event.path.display(),
                documents = nested.len(),
                "directory event expanded"
            );
        }
        let mut events = Vec::with_capacity(nested.len() + 1);
        events.push(event);
        events.extend(nested);
        events
    }

    fn stat_side(&self, key: &DocumentKey, side: Side) -> Option<Stat> {
        Stat::from_path(&self.roots.path_for(key, side)).ok()
    }

    fn plan_present(
        &mut self,
        key: &DocumentKey,
        side: Side,
        mtime: DateTime<Utc>,
    ) -> Option<PlannedAction> {
        let other = side.counterpart();
        let path = self.roots.path_for(key, side);
        let other_path = self.roots.path_for(key, other);
        let counterpart = self.stat_side(key, other);
        let threshold = self.threshold();
        let propagates = self.policy.propagates_from(side);

        let doc = self.table.get_or_insert(key);
        if doc.side(side).present && !side_changed(doc.side(side), mtime, &path, threshold) {
            tracing::debug!(document = %key, side = %side, "echo suppressed");
            doc.side_mut(side).seen_mtime = Some(mtime);
            return None;
        }
        {
            let record = doc.side_mut(side);
            record.present = true;
            record.seen_mtime = Some(mtime);
        }

        let Some(counterpart) = counterpart else {
            doc.side_mut(other).clear();
            if doc.state == DocState::Orphaned {
                return None;
            }
            doc.state = DocState::Unsynced;
            return self.plan_missing(key, side);
        };

        if key.is_dir() {
            doc.side_mut(side).mark_synced(mtime, None);
            doc.side_mut(other).mark_synced(counterpart.mtime, None);
            doc.state = DocState::Synced;
            return None;
        }

        if !propagates {
            tracing::debug!(document = %key, side = %side, "change on non-authoritative side recorded");
            doc.side_mut(other).present = true;
            doc.state = DocState::Unsynced;
            return None;
        }

        let was_synced = doc.state == DocState::Synced;
        if was_synced && !side_changed(doc.side(other), counterpart.mtime, &other_path, threshold) {
            return Some(PlannedAction::new(
                key.clone(),
                SyncAction::Convert { from: side },
                Reason::Edited,
            ));
        }

        let (source, target) = match side {
            Side::Source => (mtime, counterpart.mtime),
            Side::Target => (counterpart.mtime, mtime),
        };
        doc.side_mut(other).present = true;
        doc.side_mut(other).seen_mtime = Some(counterpart.mtime);
        if was_synced {
            tracing::info!(document = %key, "conflict detected");
            return Some(self.conflict(key, source, target));
        }
        self.pair_decision(key, source, target)
    }

    fn plan_deleted(&mut self, key: &DocumentKey, side: Side) -> Option<PlannedAction> {
        let other = side.counterpart();
        let counterpart_exists = self.stat_side(key, other).is_some();
        let delete_orphaned = self.policy.delete_orphaned && self.policy.propagates_from(side);

        let doc = self.table.get_mut(key)?;
        if !doc.side(side).present {
            return None;
        }
        doc.side_mut(side).clear();

        if !doc.side(other).present || !counterpart_exists {
            self.table.remove(key);
            tracing::debug!(document = %key, "document gone");
            return None;
        }

        if delete_orphaned {
            let action = if key.is_dir() {
                SyncAction::RemoveDir { side: other }
            } else {
                SyncAction::Delete { side: other }
            };
            return Some(PlannedAction::new(key.clone(), action, Reason::Deleted));
        }

        doc.state = DocState::Orphaned;
        tracing::info!(document = %key, missing = %side, "document orphaned");
        None
    }

    /// Creates the counterpart of a document present on `side` only.
    fn plan_missing(&mut self, key: &DocumentKey, side: Side) -> Option<PlannedAction> {
        if !self.policy.create_missing || !self.policy.propagates_from(side) {
            return None;
        }
        let action = if key.is_dir() {
            SyncAction::CreateDir {
                side: side.counterpart(),
            }
        } else {
            SyncAction::Convert { from: side }
        };
        Some(PlannedAction::new(key.clone(), action, Reason::Missing))
    }

    /// Decides between the two present sides of a document whose sync
    /// history is unknown or stale.
    fn pair_decision(
        &mut self,
        key: &DocumentKey,
        source: DateTime<Utc>,
        target: DateTime<Utc>,
    ) -> Option<PlannedAction> {
        let accept = key.is_dir()
            || (within_threshold(source, target, self.threshold())
                && !self.follower_changed(key, source, target));
        if accept {
            let doc = self.table.get_or_insert(key);
            doc.source.mark_synced(source, None);
            doc.target.mark_synced(target, None);
            doc.state = DocState::Synced;
            return None;
        }
        Some(self.conflict(key, source, target))
    }

    /// In one-way mode, true if the non-authoritative side was edited after
    /// the pair was last synced. Such a pair is never accepted as it stands.
    fn follower_changed(&self, key: &DocumentKey, source: DateTime<Utc>, target: DateTime<Utc>) -> bool {
        let Some(authority) = self.policy.authority else {
            return false;
        };
        let Some(doc) = self.table.get(key) else {
            return false;
        };
        let follower = authority.counterpart();
        let record = doc.side(follower);
        let mtime = match follower {
            Side::Source => source,
            Side::Target => target,
        };
        record.synced_mtime.is_some()
            && side_changed(record, mtime, &self.roots.path_for(key, follower), self.threshold())
    }

    /// Resolves a conflict and plans overwriting the losing side.
    fn conflict(
        &mut self,
        key: &DocumentKey,
        source: DateTime<Utc>,
        target: DateTime<Utc>,
    ) -> PlannedAction {
        let resolution = resolve(&self.policy, source, target);
        tracing::info!(
            document = %key,
            winner = %resolution.winner,
            strategy = %resolution.strategy,
            source_mtime = %source,
            target_mtime = %target,
            "conflict resolved"
        );
        let winner = resolution.winner;
        let doc = self.table.get_or_insert(key);
        doc.state = DocState::Conflict;
        doc.last_resolution = Some(resolution);
        PlannedAction::new(
            key.clone(),
            SyncAction::Convert { from: winner },
            Reason::Conflict,
        )
    }
}

/// True if the side at `path` with modification time `mtime` differs from
/// what was recorded at the last sync.
///
/// Inside the time threshold only a known, different content hash counts
/// as a change.
fn side_changed(record: &SideRecord, mtime: DateTime<Utc>, path: &Path, threshold: Duration) -> bool {
    let Some(synced) = record.synced_mtime else {
        return true;
    };
    if !within_threshold(mtime, synced, threshold) {
        return true;
    }
    match &record.synced_hash {
        Some(hash) => hexdigest_file(path).map(|h| &h != hash).unwrap_or(true),
        None => false,
    }
}

/// Splits actions into those that may run concurrently and directory
/// removals, which run afterwards, deepest first.
pub fn order_actions(actions: Vec<PlannedAction>) -> (Vec<PlannedAction>, Vec<PlannedAction>) {
    let (mut removals, mut rest): (Vec<_>, Vec<_>) =
        actions.into_iter().partition(PlannedAction::is_dir_removal);
    rest.sort_by_key(|planned| !matches!(planned.action, SyncAction::CreateDir { .. }));
    removals.sort_by(|a, b| {
        b.key
            .stem
            .components()
            .count()
            .cmp(&a.key.stem.components().count())
    });
    (rest, removals)
}
