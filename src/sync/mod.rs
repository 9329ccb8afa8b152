//! Sync orchestration.
//!
//! The [`SyncEngine`] keeps the correspondence table and plans actions from
//! change events; the [`Executor`] performs them; [`run`] ties both to a
//! [`ChangeEventSource`](crate::watch::ChangeEventSource).

mod engine;
mod executor;
mod plan;
mod resolve;
mod runner;

pub use engine::{order_actions, SyncEngine};
pub use executor::Executor;
pub use plan::{BatchPlan, Outcome, PlannedAction, Reason, SyncAction, SyncReport};
pub use resolve::resolve;
pub use runner::{execute_actions, run};
