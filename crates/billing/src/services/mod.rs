//! External collaborator traits and in-memory implementations.

pub mod activity;
pub mod ledger;

pub use activity::{ActivityExecutor, InMemoryActivityExecutor};
pub use ledger::{InMemoryLedger, Ledger};
