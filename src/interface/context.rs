//! Execution context for nbsync operations.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, SyncPolicy};
use crate::convert::Converter;
use crate::errors::Result;
use crate::io::Roots;
use crate::scan::{scan, ScanReport};
use crate::sync::{Executor, SyncEngine};

/// Everything an operation needs, resolved once from the configuration.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    /// Validated runtime policy.
    pub policy: Arc<SyncPolicy>,
    /// Canonical source and target roots.
    pub roots: Arc<Roots>,
    /// Directory relative paths are resolved against.
    pub base_dir: PathBuf,
}

impl Context {
    /// Validates `config` and resolves its roots below `base_dir`.
    ///
    /// Missing roots are created.
    pub fn new(config: Config, base_dir: PathBuf) -> Result<Self> {
        let policy = Arc::new(config.policy()?);
        let roots = Arc::new(config.roots(&base_dir)?);
        Ok(Self {
            config,
            policy,
            roots,
            base_dir,
        })
    }

    /// Creates a context from the current directory and its configuration.
    pub fn from_current_dir() -> Result<Self> {
        let base_dir = std::env::current_dir()?;
        let config = crate::config::read_config(&base_dir)?;
        Self::new(config, base_dir)
    }

    pub fn converter(&self) -> Converter {
        Converter::new(self.policy.convert.clone())
    }

    pub fn executor(&self) -> Executor {
        Executor::new(Arc::clone(&self.roots), self.converter())
    }

    /// Scans both roots.
    pub fn scan(&self) -> Result<ScanReport> {
        scan(&self.roots, &self.policy)
    }

    /// Creates an engine seeded with a scan result.
    pub fn engine(&self, report: ScanReport) -> SyncEngine {
        SyncEngine::from_scan(Arc::clone(&self.roots), Arc::clone(&self.policy), report)
    }
}
