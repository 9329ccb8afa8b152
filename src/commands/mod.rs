//! Command implementations.

pub mod check;
mod helpers;
pub mod sync;
pub mod watch;

pub use check::{check, CheckOptions};
pub use sync::{sync, SyncOptions};
pub use watch::{watch, WatchOptions};
