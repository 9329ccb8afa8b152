//! Configuration update and merging.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config_data::{Config, WatchConfig};
use super::conflict::{ConflictStrategy, SyncDirection};

/// Partial configuration update that can be merged into a Config.
///
/// All fields are optional. Only specified fields will override the base config.
/// Configuration files and command-line overrides are both read as updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, alias = "md_dir")]
    pub source_dir: Option<PathBuf>,

    #[serde(default, alias = "ipynb_dir")]
    pub target_dir: Option<PathBuf>,

    #[serde(default)]
    pub source_extension: Option<String>,

    #[serde(default)]
    pub target_extension: Option<String>,

    #[serde(default)]
    pub ignore_patterns: Option<Vec<String>>,

    #[serde(default)]
    pub debounce_delay: Option<f64>,

    #[serde(default)]
    pub watch_interval: Option<f64>,

    #[serde(default)]
    pub poll_interval: Option<f64>,

    #[serde(default)]
    pub sync_on_start: Option<bool>,

    #[serde(default)]
    pub check_on_start: Option<bool>,

    #[serde(default)]
    pub bidirectional_sync: Option<bool>,

    #[serde(default)]
    pub sync_direction: Option<SyncDirection>,

    #[serde(default)]
    pub conflict_resolution: Option<ConflictStrategy>,

    #[serde(default)]
    pub delete_orphaned: Option<bool>,

    #[serde(default)]
    pub create_missing: Option<bool>,

    #[serde(default)]
    pub default_language: Option<String>,

    #[serde(default)]
    pub preserve_output: Option<bool>,

    #[serde(default)]
    pub execution_count: Option<bool>,

    #[serde(default)]
    pub omit_default_language: Option<bool>,

    #[serde(default)]
    pub time_threshold: Option<u64>,

    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub watch: Option<WatchConfig>,
}

impl ConfigUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges this update into a base configuration, returning a new Config.
    ///
    /// Consumes `self` so fields can be moved instead of cloned.
    pub fn merge_into(self, base: &Config) -> Config {
        Config {
            source_dir: self.source_dir.unwrap_or_else(|| base.source_dir.clone()),
            target_dir: self.target_dir.unwrap_or_else(|| base.target_dir.clone()),
            source_extension: self
                .source_extension
                .unwrap_or_else(|| base.source_extension.clone()),
            target_extension: self
                .target_extension
                .unwrap_or_else(|| base.target_extension.clone()),
            ignore_patterns: self
                .ignore_patterns
                .unwrap_or_else(|| base.ignore_patterns.clone()),
            debounce_delay: self.debounce_delay.unwrap_or(base.debounce_delay),
            watch_interval: self.watch_interval.unwrap_or(base.watch_interval),
            poll_interval: self.poll_interval.unwrap_or(base.poll_interval),
            sync_on_start: self.sync_on_start.unwrap_or(base.sync_on_start),
            check_on_start: self.check_on_start.unwrap_or(base.check_on_start),
            bidirectional_sync: self.bidirectional_sync.unwrap_or(base.bidirectional_sync),
            sync_direction: self.sync_direction.unwrap_or(base.sync_direction),
            conflict_resolution: self
                .conflict_resolution
                .unwrap_or(base.conflict_resolution),
            delete_orphaned: self.delete_orphaned.unwrap_or(base.delete_orphaned),
            create_missing: self.create_missing.unwrap_or(base.create_missing),
            default_language: self
                .default_language
                .unwrap_or_else(|| base.default_language.clone()),
            preserve_output: self.preserve_output.unwrap_or(base.preserve_output),
            execution_count: self.execution_count.unwrap_or(base.execution_count),
            omit_default_language: self
                .omit_default_language
                .unwrap_or(base.omit_default_language),
            time_threshold: self.time_threshold.unwrap_or(base.time_threshold),
            log_level: self.log_level.or_else(|| base.log_level.clone()),
            watch: self.watch.unwrap_or_else(|| base.watch.clone()),
        }
    }
}
