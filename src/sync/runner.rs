//! The asynchronous orchestrator loop.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::errors::SyncError;
use crate::model::DocumentKey;
use crate::watch::ChangeEventSource;

use super::engine::{order_actions, SyncEngine};
use super::executor::Executor;
use super::plan::{PlannedAction, SyncReport};

/// Runs planned actions on the blocking pool, at most `workers` at a time,
/// and applies every outcome before returning.
///
/// Directory removals run last, one at a time, deepest first.
pub async fn execute_actions(
    engine: &mut SyncEngine,
    executor: &Executor,
    workers: &Arc<Semaphore>,
    actions: Vec<PlannedAction>,
) -> SyncReport {
    let (concurrent, removals) = order_actions(actions);
    let mut report = SyncReport::default();
    let mut outstanding: HashMap<DocumentKey, PlannedAction> = HashMap::new();
    let mut tasks = JoinSet::new();

    for planned in concurrent {
        let permit = match Arc::clone(workers).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                engine.abort(&planned.key);
                continue;
            }
        };
        let executor = executor.clone();
        outstanding.insert(planned.key.clone(), planned.clone());
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = executor.run(&planned);
            (planned, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((planned, result)) => {
                outstanding.remove(&planned.key);
                report.record(&result);
                engine.complete(&planned, result);
            }
            Err(err) => tracing::error!("sync worker failed: {}", err),
        }
    }
    // Whatever is left belongs to a worker that panicked.
    for (_, planned) in outstanding.drain() {
        let result = Err(SyncError::Other("sync worker failed".into()));
        report.record(&result);
        engine.complete(&planned, result);
    }

    for planned in removals {
        let task_executor = executor.clone();
        let task_planned = planned.clone();
        let result = tokio::task::spawn_blocking(move || task_executor.run(&task_planned))
            .await
            .unwrap_or_else(|err| Err(SyncError::Other(format!("sync worker failed: {err}"))));
        report.record(&result);
        engine.complete(&planned, result);
    }

    report
}

/// Consumes change events until `shutdown` resolves or the source ends.
///
/// Every batch is planned and executed completely, including events that
/// had to wait for an earlier action on the same document, before the
/// next batch is taken.
pub async fn run<F>(
    engine: &mut SyncEngine,
    executor: &Executor,
    source: &mut ChangeEventSource,
    shutdown: F,
) -> SyncReport
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let workers = Arc::new(Semaphore::new(engine.policy().workers));
    let mut total = SyncReport::default();

    loop {
        let mut pending = tokio::select! {
            _ = &mut shutdown => break,
            batch = source.next_batch() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };

        while !pending.is_empty() {
            let plan = engine.plan_events(pending);
            if !plan.actions.is_empty() {
                let report = execute_actions(engine, executor, &workers, plan.actions).await;
                tracing::debug!(%report, "batch done");
                total.merge(&report);
            }
            pending = plan.deferred;
        }
    }

    tracing::info!(%total, "orchestrator stopped");
    total
}
