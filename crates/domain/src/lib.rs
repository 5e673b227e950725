//! Domain layer for the bill lifecycle system.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for event-driven entities
//! - DomainEvent trait for domain events
//! - Bill aggregate implementation with its status machine and snapshots

pub mod aggregate;
pub mod bill;

pub use aggregate::{Aggregate, DomainEvent};
pub use bill::{
    Bill, BillError, BillEvent, BillSnapshot, BillStatus, ItemId, ItemStatus, LineItem, Money,
};
