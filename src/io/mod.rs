//! Filesystem access: stats, hashes, staged writes and root mapping.

mod roots;
mod stat;
mod transaction;

pub use roots::Roots;
pub use stat::{
    hexdigest_file, hexdigest_str, is_newer, set_mtime, within_threshold, Stat,
};
pub use transaction::{
    Action, CreateDir, Delete, RemoveDir, Transaction, WriteFile, STAGING_PREFIX,
};
