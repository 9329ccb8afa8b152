//! Configuration data structures.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::conflict::{ConflictStrategy, SyncDirection, WatchBackend};
use crate::errors::{Result, SyncError};
use crate::io::Roots;

/// Main configuration structure for nbsync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the Markdown tree.
    #[serde(default = "default_source_dir", alias = "md_dir")]
    pub source_dir: PathBuf,

    /// Root of the notebook tree.
    #[serde(default = "default_target_dir", alias = "ipynb_dir")]
    pub target_dir: PathBuf,

    /// File extension of Markdown documents, without the dot.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// File extension of notebooks, without the dot.
    #[serde(default = "default_target_extension")]
    pub target_extension: String,

    /// Glob patterns; a path is ignored when any of its components matches.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Quiet period before a change is emitted, in seconds.
    #[serde(default = "default_debounce_delay")]
    pub debounce_delay: f64,

    /// Native watcher latency hint, in seconds.
    #[serde(default = "default_watch_interval")]
    pub watch_interval: f64,

    /// Interval between polling scans, in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,

    /// Reconcile both trees before watching.
    #[serde(default = "default_true")]
    pub sync_on_start: bool,

    /// Scan and report discrepancies before watching.
    #[serde(default = "default_true")]
    pub check_on_start: bool,

    /// Propagate changes in both directions.
    #[serde(default = "default_true")]
    pub bidirectional_sync: bool,

    /// Authoritative direction when `bidirectional_sync` is off.
    #[serde(default)]
    pub sync_direction: SyncDirection,

    /// Winner selection when both sides changed.
    #[serde(default)]
    pub conflict_resolution: ConflictStrategy,

    /// Delete the counterpart when one side is deleted.
    #[serde(default = "default_true")]
    pub delete_orphaned: bool,

    /// Create the counterpart of one-sided documents.
    #[serde(default = "default_true")]
    pub create_missing: bool,

    /// Language assigned to untagged code fences.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Keep notebook outputs across conversions.
    #[serde(default = "default_true")]
    pub preserve_output: bool,

    /// Keep execution counts across conversions.
    #[serde(default = "default_true")]
    pub execution_count: bool,

    /// Write untagged fences for code in the default language.
    #[serde(default)]
    pub omit_default_language: bool,

    /// Tolerance for comparing modification times, in whole seconds.
    #[serde(default = "default_time_threshold")]
    pub time_threshold: u64,

    /// Log level used when none is given on the command line.
    #[serde(default)]
    pub log_level: Option<String>,

    /// Watch configuration.
    #[serde(default)]
    pub watch: WatchConfig,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("markdown")
}

fn default_target_dir() -> PathBuf {
    PathBuf::from("notebooks")
}

fn default_source_extension() -> String {
    "md".to_string()
}

fn default_target_extension() -> String {
    "ipynb".to_string()
}

fn default_ignore_patterns() -> Vec<String> {
    [
        ".*",
        "__pycache__",
        ".ipynb_checkpoints",
        ".git",
        ".vscode",
        "node_modules",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_debounce_delay() -> f64 {
    0.8
}

fn default_watch_interval() -> f64 {
    1.0
}

fn default_poll_interval() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "python".to_string()
}

fn default_time_threshold() -> u64 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            target_dir: default_target_dir(),
            source_extension: default_source_extension(),
            target_extension: default_target_extension(),
            ignore_patterns: default_ignore_patterns(),
            debounce_delay: default_debounce_delay(),
            watch_interval: default_watch_interval(),
            poll_interval: default_poll_interval(),
            sync_on_start: true,
            check_on_start: true,
            bidirectional_sync: true,
            sync_direction: SyncDirection::default(),
            conflict_resolution: ConflictStrategy::default(),
            delete_orphaned: true,
            create_missing: true,
            default_language: default_language(),
            preserve_output: true,
            execution_count: true,
            omit_default_language: false,
            time_threshold: default_time_threshold(),
            log_level: None,
            watch: WatchConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves both roots against `base_dir`, creating them when missing.
    ///
    /// Fails when a root exists but is not a directory, or when one root
    /// contains the other.
    pub fn roots(&self, base_dir: &Path) -> Result<Roots> {
        let source = resolve_root(base_dir, &self.source_dir)?;
        let target = resolve_root(base_dir, &self.target_dir)?;

        if source.starts_with(&target) || target.starts_with(&source) {
            return Err(SyncError::Config(format!(
                "roots overlap: {} and {}",
                source.display(),
                target.display()
            )));
        }

        Ok(Roots::new(
            source,
            target,
            self.source_extension.trim_start_matches('.'),
            self.target_extension.trim_start_matches('.'),
        ))
    }
}

fn resolve_root(base_dir: &Path, dir: &Path) -> Result<PathBuf> {
    let path = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base_dir.join(dir)
    };

    if path.exists() && !path.is_dir() {
        return Err(SyncError::Config(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    if !path.exists() {
        tracing::info!(path = %path.display(), "creating missing root");
        std::fs::create_dir_all(&path)?;
    }
    Ok(path.canonicalize()?)
}

/// Watch mode configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Backend for the Markdown root.
    #[serde(default)]
    pub source: WatchBackend,

    /// Backend for the notebook root.
    #[serde(default = "default_target_backend")]
    pub target: WatchBackend,

    /// Maximum number of conversions running at once.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_target_backend() -> WatchBackend {
    WatchBackend::Poll
}

fn default_workers() -> usize {
    4
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            source: WatchBackend::Native,
            target: default_target_backend(),
            workers: default_workers(),
        }
    }
}
