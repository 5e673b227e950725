//! Shared identifiers and currency codes for the billing system.

pub mod currency;
pub mod types;

pub use currency::{Currency, UnsupportedCurrency};
pub use types::BillId;
