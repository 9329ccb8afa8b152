//! Sync command implementation.

use crate::errors::Result;
use crate::interface::Context;
use crate::sync::SyncReport;

use super::helpers::print_plan;

/// Options for the sync command.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Show what would be done without doing it.
    pub dry_run: bool,
}

/// Runs one reconciliation pass over both trees.
pub fn sync(ctx: &Context, options: SyncOptions) -> Result<SyncReport> {
    tracing::info!("synchronizing documents");

    let mut engine = ctx.engine(ctx.scan()?);

    if options.dry_run {
        print_plan(ctx, &engine.plan_reconcile());
        return Ok(SyncReport::default());
    }

    let report = engine.reconcile(&ctx.executor());
    println!("Synchronization complete: {}", report);
    Ok(report)
}
