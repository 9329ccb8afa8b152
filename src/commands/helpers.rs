//! Shared output helpers for commands.

use crate::interface::Context;
use crate::scan::{relative_path, ScanReport};
use crate::sync::PlannedAction;

/// Prints a scan summary, listing every problem when `verbose` is set.
pub(crate) fn print_scan(ctx: &Context, report: &ScanReport, verbose: bool) {
    let roots = &ctx.roots;

    println!("Documents: {}", report.table.len());
    println!("  In sync: {}", report.in_sync);
    println!("  Stale pairs: {}", report.stale.len());
    println!("  Missing counterparts: {}", report.discrepancies.len());

    if !verbose {
        return;
    }
    for stale in &report.stale {
        println!(
            "  stale: {} is older than {}",
            relative_path(roots, &stale.key, stale.stale).display(),
            relative_path(roots, &stale.key, stale.stale.counterpart()).display()
        );
    }
    for discrepancy in &report.discrepancies {
        println!(
            "  missing: {} has no {}",
            relative_path(roots, &discrepancy.key, discrepancy.present).display(),
            relative_path(roots, &discrepancy.key, discrepancy.present.counterpart()).display()
        );
    }
}

/// Prints the actions a run would perform.
pub(crate) fn print_plan(ctx: &Context, actions: &[PlannedAction]) {
    if actions.is_empty() {
        println!("Nothing to do.");
        return;
    }
    println!("Would perform {} action(s):", actions.len());
    for planned in actions {
        println!("  {}", planned.describe(&ctx.roots));
    }
}
