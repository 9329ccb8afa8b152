//! Check command implementation.

use crate::errors::Result;
use crate::interface::Context;

use super::helpers::print_scan;

/// Options for the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// List every stale pair and missing counterpart.
    pub verbose: bool,
}

/// Scans both roots and reports inconsistencies without writing anything.
///
/// Returns true when every document has an up-to-date counterpart.
pub fn check(ctx: &Context, options: CheckOptions) -> Result<bool> {
    let report = ctx.scan()?;
    print_scan(ctx, &report, options.verbose);

    let consistent = report.is_consistent();
    if consistent {
        println!("All documents are in sync.");
    }
    Ok(consistent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_utils::{at, write_at};
    use tempfile::tempdir;

    #[test]
    fn test_check_reports_without_writing() {
        let dir = tempdir().unwrap();
        let ctx = Context::new(Config::default(), dir.path().to_path_buf()).unwrap();
        assert!(check(&ctx, CheckOptions::default()).unwrap());

        let path = ctx.roots.source.join("a.md");
        write_at(&path, "# A\n", at(0));
        assert!(!check(&ctx, CheckOptions { verbose: true }).unwrap());
        assert!(!ctx.roots.target.join("a.ipynb").exists());
    }
}
