//! Executes planned actions against the filesystem.

use std::fs;
use std::io;
use std::sync::Arc;

use crate::convert::Converter;
use crate::errors::{Result, SyncError};
use crate::io::{hexdigest_str, set_mtime, CreateDir, Delete, RemoveDir, Roots, Stat, Transaction, WriteFile};
use crate::model::{DocumentKey, Notebook, Side};

use super::plan::{Outcome, PlannedAction, SyncAction};

/// Stateless action runner; cheap to clone into worker tasks.
#[derive(Debug, Clone)]
pub struct Executor {
    roots: Arc<Roots>,
    converter: Converter,
}

impl Executor {
    pub fn new(roots: Arc<Roots>, converter: Converter) -> Self {
        Self { roots, converter }
    }

    /// Runs one action. Blocking; call from a blocking context.
    pub fn run(&self, planned: &PlannedAction) -> Result<Outcome> {
        let key = &planned.key;
        match planned.action {
            SyncAction::Convert { from } => self.convert(key, from),
            SyncAction::Delete { side } => {
                let mut tx = Transaction::new();
                tx.add(Delete::new(self.roots.path_for(key, side)));
                tx.execute()?;
                Ok(Outcome::Deleted { side })
            }
            SyncAction::CreateDir { side } => {
                let path = self.roots.path_for(key, side);
                let mut tx = Transaction::new();
                tx.add(CreateDir::new(&path));
                tx.execute()?;
                let mtime = Stat::from_path(&path)?.mtime;
                Ok(Outcome::DirCreated { side, mtime })
            }
            SyncAction::RemoveDir { side } => {
                let path = self.roots.path_for(key, side);
                let mut tx = Transaction::new();
                tx.add(RemoveDir::new(&path));
                tx.execute()?;
                Ok(Outcome::DirRemoved {
                    side,
                    removed: !path.exists(),
                })
            }
        }
    }

    fn convert(&self, key: &DocumentKey, from: Side) -> Result<Outcome> {
        let input_path = self.roots.path_for(key, from);
        let output_path = self.roots.path_for(key, from.counterpart());

        let input = match fs::read_to_string(&input_path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Outcome::Skipped(format!(
                    "{} vanished before conversion",
                    input_path.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };
        let from_mtime = Stat::from_path(&input_path)?.mtime;
        let existing = read_optional(&output_path)?;

        let mut diagnostic = None;
        let output = match from {
            Side::Source => {
                let base = existing
                    .as_deref()
                    .filter(|text| !text.trim().is_empty())
                    .and_then(|text| Notebook::from_json(text).ok());
                self.converter.document_to_notebook_json(&input, base.as_ref())?
            }
            Side::Target => {
                let decoded = self.converter.notebook_text_to_cells(&input);
                if let Some(message) = &decoded.diagnostic {
                    let err = SyncError::Conversion {
                        path: input_path.clone(),
                        message: message.clone(),
                    };
                    tracing::warn!(error = %err, "conversion error");
                }
                diagnostic = decoded.diagnostic;
                self.converter.cells_to_document(&decoded.cells)
            }
        };

        let wrote = existing.as_deref() != Some(output.as_str());
        if wrote {
            let mut tx = Transaction::new();
            tx.add(WriteFile::new(&output_path, output.as_str()).with_mtime(from_mtime));
            tx.execute()?;
        } else {
            set_mtime(&output_path, from_mtime)?;
        }
        let to_mtime = Stat::from_path(&output_path)?.mtime;

        Ok(Outcome::Converted {
            from,
            from_mtime,
            from_hash: hexdigest_str(&input),
            to_mtime,
            to_hash: hexdigest_str(&output),
            wrote,
            diagnostic,
        })
    }
}

fn read_optional(path: &std::path::Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
