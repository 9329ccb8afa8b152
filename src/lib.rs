//! nbsync - Markdown and Jupyter notebook directory synchronization
//!
//! This library keeps a tree of Markdown documents and a parallel tree of
//! Jupyter notebooks in step. Every `a/b.md` below the source root has a
//! counterpart `a/b.ipynb` below the target root; an edit on either side is
//! converted and written to the other.
//!
//! # Features
//!
//! - **Convert**: Markdown prose and fenced code blocks to notebook cells and back,
//!   keeping outputs and metadata of unchanged code cells
//! - **Check**: Scan both trees and report stale pairs and missing counterparts
//! - **Sync**: Reconcile both trees once
//! - **Watch**: Follow changes with native notifications or polling and sync continuously
//!
//! # Example
//!
//! ```no_run
//! use nbsync::interface::Context;
//! use nbsync::commands::{sync, SyncOptions};
//!
//! let ctx = Context::from_current_dir().unwrap();
//! let report = sync(&ctx, SyncOptions::default()).unwrap();
//! println!("{}", report);
//! ```

pub mod commands;
pub mod config;
pub mod convert;
pub mod errors;
pub mod interface;
pub mod io;
pub mod model;
pub mod readers;
pub mod scan;
pub mod sync;
pub mod watch;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use config::{Config, SyncPolicy};
pub use convert::{ConvertOptions, Converter};
pub use errors::{Result, SyncError};
pub use interface::Context;
pub use model::{Cell, ChangeEvent, DocumentKey, Notebook, Side};
pub use sync::{SyncEngine, SyncReport};

// Re-export command options
pub use commands::{CheckOptions, SyncOptions, WatchOptions};
