//! HTTP route handlers.

pub mod balances;
pub mod bills;
pub mod health;
pub mod metrics;
