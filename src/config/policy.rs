//! Immutable runtime policy derived from a validated configuration.

use std::time::Duration;

use super::config_data::Config;
use super::conflict::{ConflictStrategy, WatchBackend};
use crate::convert::ConvertOptions;
use crate::errors::{Result, SyncError};
use crate::model::Side;
use crate::scan::IgnoreSet;

/// Settings shared by the scanner, the watchers and the orchestrator.
///
/// Built once from a [`Config`] and passed around behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    pub ignore: IgnoreSet,
    pub debounce: Duration,
    pub poll_interval: Duration,
    pub watch_interval: Duration,
    pub source_backend: WatchBackend,
    pub target_backend: WatchBackend,
    pub workers: usize,
    pub conflict: ConflictStrategy,
    /// `None` when both directions propagate.
    pub authority: Option<Side>,
    pub delete_orphaned: bool,
    pub create_missing: bool,
    pub time_threshold: chrono::Duration,
    pub convert: ConvertOptions,
}

impl SyncPolicy {
    /// Validates `config` and builds the policy.
    pub fn from_config(config: &Config) -> Result<Self> {
        let debounce = seconds("debounce_delay", config.debounce_delay, true)?;
        let poll_interval = seconds("poll_interval", config.poll_interval, false)?;
        let watch_interval = seconds("watch_interval", config.watch_interval, false)?;

        if config.watch.workers == 0 {
            return Err(SyncError::Config("watch.workers must be at least 1".into()));
        }
        if config.default_language.trim().is_empty() {
            return Err(SyncError::Config("default_language must not be empty".into()));
        }
        if config.source_extension.trim_start_matches('.')
            == config.target_extension.trim_start_matches('.')
        {
            return Err(SyncError::Config(
                "source and target extensions must differ".into(),
            ));
        }
        let time_threshold = i64::try_from(config.time_threshold)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| SyncError::Config("time_threshold is too large".into()))?;

        Ok(Self {
            ignore: IgnoreSet::new(&config.ignore_patterns)?,
            debounce,
            poll_interval,
            watch_interval,
            source_backend: config.watch.source,
            target_backend: config.watch.target,
            workers: config.watch.workers,
            conflict: config.conflict_resolution,
            authority: if config.bidirectional_sync {
                None
            } else {
                Some(config.sync_direction.authority())
            },
            delete_orphaned: config.delete_orphaned,
            create_missing: config.create_missing,
            time_threshold,
            convert: ConvertOptions {
                default_language: config.default_language.clone(),
                preserve_output: config.preserve_output,
                execution_count: config.execution_count,
                omit_default_language: config.omit_default_language,
            },
        })
    }

    /// Returns true if changes on `side` may be propagated to its counterpart.
    pub fn propagates_from(&self, side: Side) -> bool {
        self.authority.map_or(true, |authority| authority == side)
    }

    /// Watch backend configured for `side`.
    pub fn backend(&self, side: Side) -> WatchBackend {
        match side {
            Side::Source => self.source_backend,
            Side::Target => self.target_backend,
        }
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            ignore: IgnoreSet::default(),
            debounce: Duration::from_millis(800),
            poll_interval: Duration::from_secs(2),
            watch_interval: Duration::from_secs(1),
            source_backend: WatchBackend::Native,
            target_backend: WatchBackend::Poll,
            workers: 4,
            conflict: ConflictStrategy::Newer,
            authority: None,
            delete_orphaned: true,
            create_missing: true,
            time_threshold: chrono::Duration::seconds(3),
            convert: ConvertOptions::default(),
        }
    }
}

fn seconds(name: &str, value: f64, allow_zero: bool) -> Result<Duration> {
    let invalid = || SyncError::Config(format!("{name} must be a positive number of seconds"));
    let duration = Duration::try_from_secs_f64(value).map_err(|_| invalid())?;
    // Values below a nanosecond round to zero.
    if !allow_zero && duration.is_zero() {
        return Err(invalid());
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncDirection;

    #[test]
    fn test_from_default_config() {
        let policy = SyncPolicy::from_config(&Config::default()).unwrap();
        assert_eq!(policy.debounce, Duration::from_millis(800));
        assert_eq!(policy.time_threshold, chrono::Duration::seconds(3));
        assert!(policy.propagates_from(Side::Source));
        assert!(policy.propagates_from(Side::Target));
        assert_eq!(policy.convert.default_language, "python");
    }

    #[test]
    fn test_one_way() {
        let config = Config {
            bidirectional_sync: false,
            sync_direction: SyncDirection::IpynbToMd,
            ..Config::default()
        };
        let policy = SyncPolicy::from_config(&config).unwrap();
        assert!(!policy.propagates_from(Side::Source));
        assert!(policy.propagates_from(Side::Target));
    }

    #[test]
    fn test_invalid_values() {
        let config = Config {
            poll_interval: 0.0,
            ..Config::default()
        };
        assert!(SyncPolicy::from_config(&config).is_err());

        let mut config = Config::default();
        config.watch.workers = 0;
        assert!(SyncPolicy::from_config(&config).is_err());

        let config = Config {
            target_extension: ".md".into(),
            ..Config::default()
        };
        assert!(SyncPolicy::from_config(&config).is_err());

        let config = Config {
            debounce_delay: 1e30,
            ..Config::default()
        };
        assert!(matches!(
            SyncPolicy::from_config(&config),
            Err(SyncError::Config(_))
        ));

        let config = Config {
            poll_interval: 1e-12,
            ..Config::default()
        };
        assert!(matches!(
            SyncPolicy::from_config(&config),
            Err(SyncError::Config(_))
        ));

        let config = Config {
            time_threshold: u64::MAX / 2,
            ..Config::default()
        };
        assert!(matches!(
            SyncPolicy::from_config(&config),
            Err(SyncError::Config(_))
        ));

        let config = Config {
            ignore_patterns: vec!["[".into()],
            ..Config::default()
        };
        assert!(matches!(
            SyncPolicy::from_config(&config),
            Err(SyncError::GlobPattern(_))
        ));
    }
}
