//! Watch command implementation.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::errors::Result;
use crate::interface::Context;
use crate::model::DocState;
use crate::scan::ScanReport;
use crate::sync::{execute_actions, run, SyncEngine};
use crate::watch::ChangeEventSource;

use super::helpers::{print_plan, print_scan};

/// Options for the watch command.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Report the startup plan and exit without watching.
    pub dry_run: bool,
}

/// Runs the startup check and sync, then watches both roots until Ctrl-C.
pub fn watch(ctx: &Context, options: WatchOptions) -> Result<()> {
    let config = &ctx.config;

    let report = if config.check_on_start || config.sync_on_start {
        ctx.scan()?
    } else {
        ScanReport::default()
    };
    if config.check_on_start {
        print_scan(ctx, &report, false);
    }
    let mut engine = ctx.engine(report);

    if options.dry_run {
        let actions = if config.sync_on_start {
            engine.plan_reconcile()
        } else {
            Vec::new()
        };
        print_plan(ctx, &actions);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch_loop(ctx, &mut engine))
}

async fn watch_loop(ctx: &Context, engine: &mut SyncEngine) -> Result<()> {
    let executor = ctx.executor();
    // Start watching before the startup sync so edits made meanwhile are seen.
    let mut source = ChangeEventSource::spawn(Arc::clone(&ctx.roots), Arc::clone(&ctx.policy));

    if ctx.config.sync_on_start {
        let workers = Arc::new(Semaphore::new(ctx.policy.workers));
        let actions = engine.plan_reconcile();
        let report = execute_actions(engine, &executor, &workers, actions).await;
        tracing::info!(%report, "startup sync done");
    }

    println!(
        "Watching {} <-> {}",
        ctx.roots.source.display(),
        ctx.roots.target.display()
    );
    println!("Press Ctrl+C to stop.");

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("cannot listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };
    run(engine, &executor, &mut source, shutdown).await;
    source.shutdown().await;

    let orphans = engine.table().count(DocState::Orphaned);
    if orphans > 0 {
        tracing::info!(orphans, "orphaned documents left in place");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_utils::{at, write_at};
    use tempfile::tempdir;

    #[test]
    fn test_dry_run_reports_and_exits() {
        let dir = tempdir().unwrap();
        let ctx = Context::new(Config::default(), dir.path().to_path_buf()).unwrap();
        write_at(&ctx.roots.source.join("a.md"), "# A\n", at(0));

        watch(&ctx, WatchOptions { dry_run: true }).unwrap();
        assert!(!ctx.roots.target.join("a.ipynb").exists());
    }
}
