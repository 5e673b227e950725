//! Bill and line item state machines.

use serde::{Deserialize, Serialize};

/// The status of a bill in its lifecycle.
///
/// State transitions:
/// ```text
/// Open ──┬──► Charging ──┬──► Settled
///        │               ├──► Failed
///        │               └──► Compensated
///        ├──► Canceled
///        └──► Expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BillStatus {
    /// Bill accepts new line items.
    #[default]
    Open,

    /// Pending items are being charged.
    Charging,

    /// Every item was charged (terminal state).
    Settled,

    /// Bill was canceled before charging (terminal state).
    Canceled,

    /// Deadline passed before a charge was requested (terminal state).
    Expired,

    /// Every item failed to charge (terminal state).
    Failed,

    /// Some items failed and the charged ones were refunded (terminal state).
    Compensated,
}

impl BillStatus {
    /// Returns true if items can be added in this status.
    pub fn can_add_items(&self) -> bool {
        matches!(self, BillStatus::Open)
    }

    /// Returns true if charging can begin in this status.
    pub fn can_begin_charge(&self) -> bool {
        matches!(self, BillStatus::Open)
    }

    /// Returns true if the bill can be canceled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, BillStatus::Open)
    }

    /// Returns true if the charging outcome can be recorded in this status.
    pub fn can_resolve(&self) -> bool {
        matches!(self, BillStatus::Charging)
    }

    /// Returns true if this is a terminal status (no further mutation possible).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BillStatus::Open | BillStatus::Charging)
    }

    /// Returns true if a bill in this status can hold an item in `item`.
    pub fn can_hold_item(&self, item: ItemStatus) -> bool {
        match self {
            BillStatus::Open => item == ItemStatus::Pending,
            BillStatus::Charging => matches!(
                item,
                ItemStatus::Pending | ItemStatus::Charged | ItemStatus::Failed
            ),
            BillStatus::Settled => item == ItemStatus::Charged,
            BillStatus::Failed => item == ItemStatus::Failed,
            BillStatus::Compensated => {
                matches!(item, ItemStatus::Failed | ItemStatus::Refunded)
            }
            BillStatus::Canceled | BillStatus::Expired => item == ItemStatus::Canceled,
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Open => "Open",
            BillStatus::Charging => "Charging",
            BillStatus::Settled => "Settled",
            BillStatus::Canceled => "Canceled",
            BillStatus::Expired => "Expired",
            BillStatus::Failed => "Failed",
            BillStatus::Compensated => "Compensated",
        }
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The status of a single line item.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Charged ──► Refunded
///           ├──► Failed
///           └──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    /// Added to the bill, not yet charged.
    #[default]
    Pending,

    /// Charge succeeded.
    Charged,

    /// Charge failed after every retry.
    Failed,

    /// Bill was canceled or expired while the item was pending.
    Canceled,

    /// Charge was reversed during compensation.
    Refunded,
}

impl ItemStatus {
    /// Returns true if an item may move from this status to `next`.
    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (
                ItemStatus::Pending,
                ItemStatus::Charged | ItemStatus::Failed | ItemStatus::Canceled
            ) | (ItemStatus::Charged, ItemStatus::Refunded)
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "Pending",
            ItemStatus::Charged => "Charged",
            ItemStatus::Failed => "Failed",
            ItemStatus::Canceled => "Canceled",
            ItemStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
