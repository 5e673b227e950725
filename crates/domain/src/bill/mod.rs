//! Bill aggregate and related types.

mod aggregate;
mod events;
mod snapshot;
mod state;
mod value_objects;

pub use aggregate::Bill;
pub use events::{
    BillEvent, BillOpenedData, ChargeOutcomeData, ChargeStartedData, ClosedData, ItemAddedData,
    ItemChargeFailedData, ItemData,
};
pub use snapshot::BillSnapshot;
pub use state::{BillStatus, ItemStatus};
pub use value_objects::{ItemId, LineItem, Money};

use thiserror::Error;

/// Errors that can occur during bill operations.
///
/// Every variant is a rejected request: the bill is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillError {
    /// Items can only be added, and charging begun, while the bill is open.
    #[error("bill is not open (status {status})")]
    NotOpen { status: BillStatus },

    /// An item with the same identifier is already on the bill.
    #[error("item {item_id} already exists")]
    DuplicateItem { item_id: ItemId },

    /// Charging needs at least one pending item.
    #[error("no pending items to charge")]
    NoPendingItems,

    /// Only open bills can be canceled.
    #[error("cannot cancel bill in status {status}")]
    CannotCancel { status: BillStatus },

    /// Item amounts must be positive.
    #[error("invalid amount: {amount} (must be greater than 0)")]
    InvalidAmount { amount: i64 },

    /// Item identifier is empty.
    #[error("item id is required and must be non-empty")]
    EmptyItemId,

    /// Item name is empty.
    #[error("item name is required and must be non-empty")]
    EmptyItemName,

    /// Adding the item would overflow the running total.
    #[error("bill total overflow")]
    TotalOverflow,

    /// No item with this identifier is on the bill.
    #[error("item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    /// The item status table forbids this move.
    #[error("item {item_id} cannot move from {from} to {to}")]
    InvalidItemTransition {
        item_id: ItemId,
        from: ItemStatus,
        to: ItemStatus,
    },

    /// The bill is not in a status that allows this action.
    #[error("invalid state transition: cannot {action} from {current_status} status")]
    InvalidTransition {
        current_status: BillStatus,
        action: &'static str,
    },

    /// A snapshot holds an item status its bill status cannot have.
    #[error("bill in status {bill_status} cannot hold item {item_id} in status {item_status}")]
    InconsistentItemStatus {
        item_id: ItemId,
        item_status: ItemStatus,
        bill_status: BillStatus,
    },

    /// An event history must start with the bill being opened.
    #[error("event history does not start with BillOpened")]
    MissingOpenEvent,
}
