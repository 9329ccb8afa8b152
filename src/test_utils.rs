//! Shared test utilities.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::io::{set_mtime, Roots};
use crate::model::{Cell, CodeCell};

/// Creates a code cell carrying one output and an execution count.
pub fn code_with_output(language: &str, source: &str, output: Value, count: u64) -> Cell {
    Cell::Code(CodeCell {
        language: language.to_string(),
        source: source.to_string(),
        outputs: vec![output],
        execution_count: Some(count),
    })
}

/// A fixed reference instant, whole seconds so filesystems can store it exactly.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// `base_time()` shifted by `secs` seconds.
pub fn at(secs: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(secs)
}

/// Writes `content` to `path`, creating parents, and sets its mtime.
pub fn write_at(path: &Path, content: &str, mtime: DateTime<Utc>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    set_mtime(path, mtime).unwrap();
}

/// Creates `markdown/` and `notebooks/` roots inside `dir`.
pub fn make_roots(dir: &Path) -> Roots {
    let source = dir.join("markdown");
    let target = dir.join("notebooks");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&target).unwrap();
    Roots::new(source, target, "md", "ipynb")
}

/// Absolute path of `rel` below the source root.
pub fn md(roots: &Roots, rel: &str) -> PathBuf {
    roots.source.join(rel)
}

/// Absolute path of `rel` below the target root.
pub fn nb(roots: &Roots, rel: &str) -> PathBuf {
    roots.target.join(rel)
}
