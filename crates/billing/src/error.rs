//! Billing error types.

use common::{BillId, Currency};
use domain::{BillError, BillStatus, ItemId, Money};
use thiserror::Error;

/// Error reported by one charge attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivityError {
    /// The payment provider refused the charge.
    #[error("charge declined for item {item_id}: {reason}")]
    Declined { item_id: ItemId, reason: String },

    /// The payment provider could not be reached.
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the account ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Credits of zero are rejected.
    #[error("amount must not be zero")]
    ZeroAmount,

    /// Amount is negative or would overflow the balance.
    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: i64 },

    /// The balance does not cover the withdrawal.
    #[error("insufficient funds: {currency} balance is {balance}, requested {requested}")]
    InsufficientFunds {
        currency: Currency,
        balance: Money,
        requested: Money,
    },

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by bill workflows and their handles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// The aggregate rejected a signal. The bill is unchanged.
    #[error(transparent)]
    Rejected(#[from] BillError),

    /// Every item failed to charge.
    #[error("charge failed for every item: {}", join_ids(.failed_items))]
    ChargeFailed { failed_items: Vec<ItemId> },

    /// Some items failed to charge and the charged ones were refunded.
    #[error(
        "charge failed for items {}; {} charged item(s) refunded",
        join_ids(.failed_items),
        .refunded
    )]
    ChargeCompensated {
        failed_items: Vec<ItemId>,
        refunded: usize,
    },

    /// Resolution was reached in a status it can never legally be in.
    #[error("bill reached resolution in unexpected status {status}")]
    InvalidState { status: BillStatus },

    /// No workflow is registered under this bill identifier.
    #[error("bill not found: {0}")]
    BillNotFound(BillId),

    /// The workflow task stopped before replying.
    #[error("bill workflow is no longer running")]
    LoopClosed,
}

impl BillingError {
    /// Returns a stable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            BillingError::Rejected(_) => "Rejected",
            BillingError::ChargeFailed { .. } => "ChargeFailed",
            BillingError::ChargeCompensated { .. } => "ChargeCompensated",
            BillingError::InvalidState { .. } => "InvalidState",
            BillingError::BillNotFound(_) => "BillNotFound",
            BillingError::LoopClosed => "LoopClosed",
        }
    }

    /// Returns true for programming errors that must never be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BillingError::InvalidState { .. })
    }

    /// Returns the items whose charge failed, for the two charge outcomes.
    pub fn failed_items(&self) -> Option<&[ItemId]> {
        match self {
            BillingError::ChargeFailed { failed_items }
            | BillingError::ChargeCompensated { failed_items, .. } => Some(failed_items),
            _ => None,
        }
    }
}

fn join_ids(ids: &[ItemId]) -> String {
    ids.iter()
        .map(ItemId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type alias for billing results.
pub type Result<T> = std::result::Result<T, BillingError>;
