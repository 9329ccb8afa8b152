//! Configuration loading and management.

mod config_data;
mod config_update;
mod conflict;
mod policy;

use std::fs;
use std::path::{Path, PathBuf};

pub use config_data::{Config, WatchConfig};
pub use config_update::ConfigUpdate;
pub use conflict::{ConflictStrategy, SyncDirection, WatchBackend};
pub use policy::SyncPolicy;

use crate::errors::Result;

/// Standard configuration file names to search for.
const CONFIG_FILES: &[&str] = &["nbsync.toml", ".nbsync.toml", "nbsync.json"];

/// Finds the configuration file in the given directory or its parents.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        for name in CONFIG_FILES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Reads a configuration update from a TOML or JSON file.
pub fn read_config_update(path: &Path) -> Result<ConfigUpdate> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(toml::from_str(&content)?)
    }
}

/// Reads configuration from a TOML or JSON file.
pub fn read_config_file(path: &Path) -> Result<Config> {
    tracing::debug!(path = %path.display(), "reading configuration");
    Ok(read_config_update(path)?.merge_into(&Config::default()))
}

/// Reads configuration, searching from the given directory.
///
/// If no config file is found, returns the default configuration.
pub fn read_config(start_dir: &Path) -> Result<Config> {
    match find_config_file(start_dir) {
        Some(path) => read_config_file(&path),
        None => Ok(Config::default()),
    }
}

impl Config {
    /// Validates this configuration and derives the runtime policy.
    pub fn policy(&self) -> Result<SyncPolicy> {
        SyncPolicy::from_config(self)
    }
}
