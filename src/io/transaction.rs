//! Staged filesystem actions.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};

use crate::errors::Result;

/// File-name prefix of staging files; always ignored by scanners and watchers.
pub const STAGING_PREFIX: &str = ".nbsync-tmp-";

/// An action that can be executed as part of a transaction.
pub trait Action: std::fmt::Debug + Send + Sync {
    /// Executes the action.
    fn execute(&self) -> Result<()>;

    /// Returns a description of this action.
    fn describe(&self) -> String;
}

/// Write a file atomically, optionally stamping its modification time.
#[derive(Debug)]
pub struct WriteFile {
    pub path: PathBuf,
    pub content: String,
    /// Modification time to give the file before it becomes visible.
    pub mtime: Option<DateTime<Utc>>,
}

impl WriteFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            mtime: None,
        }
    }

    pub fn with_mtime(mut self, mtime: DateTime<Utc>) -> Self {
        self.mtime = Some(mtime);
        self
    }
}

impl Action for WriteFile {
    fn execute(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&self.path, &self.content, self.mtime)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("write {}", self.path.display())
    }
}

/// Delete a file.
#[derive(Debug)]
pub struct Delete {
    pub path: PathBuf,
}

impl Delete {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Action for Delete {
    fn execute(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        format!("delete {}", self.path.display())
    }
}

/// Create a directory and its parents.
#[derive(Debug)]
pub struct CreateDir {
    pub path: PathBuf,
}

impl CreateDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Action for CreateDir {
    fn execute(&self) -> Result<()> {
        fs::create_dir_all(&self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("mkdir {}", self.path.display())
    }
}

/// Remove a directory, but only when it is empty.
#[derive(Debug)]
pub struct RemoveDir {
    pub path: PathBuf,
}

impl RemoveDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Action for RemoveDir {
    fn execute(&self) -> Result<()> {
        if !self.path.is_dir() {
            return Ok(());
        }
        if fs::read_dir(&self.path)?.next().is_some() {
            tracing::warn!(path = %self.path.display(), "directory not empty, keeping it");
            return Ok(());
        }
        fs::remove_dir(&self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("rmdir {}", self.path.display())
    }
}

/// A sequence of actions executed in order.
#[derive(Debug, Default)]
pub struct Transaction {
    actions: Vec<Box<dyn Action>>,
}

impl Transaction {
    /// Creates a new empty transaction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Adds an action to the transaction.
    pub fn add(&mut self, action: impl Action + 'static) {
        self.actions.push(Box::new(action));
    }

    /// Executes all actions, stopping at the first failure.
    pub fn execute(&self) -> Result<()> {
        for action in &self.actions {
            tracing::debug!("{}", action.describe());
            action.execute()?;
        }
        Ok(())
    }
}

/// Counter for unique temp file names.
static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Writes content to a file atomically using a temp file + rename.
///
/// The temp file lives next to the destination, is synced, and gets its
/// final modification time before the rename, so readers only ever see the
/// complete file with its final timestamp.
fn atomic_write(path: &Path, content: &str, mtime: Option<DateTime<Utc>>) -> io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_path = parent.join(format!(
        "{}{}-{}",
        STAGING_PREFIX,
        std::process::id(),
        counter,
    ));

    let staged = (|| {
        let mut file = File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        if let Some(mtime) = mtime {
            file.set_modified(mtime.into())?;
        }
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, path)
    })();

    if staged.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    staged
}
