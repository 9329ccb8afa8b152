//! High-level interface for nbsync operations.

mod context;

pub use context::Context;
