//! Deciding the terminal outcome of a charged bill.

use domain::{Bill, BillStatus, ItemId, ItemStatus};

use crate::error::BillingError;

/// What to do with a bill once every charge finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No item failed: settle and credit the ledger.
    Settle,
    /// Every item failed: fail the bill, nothing to refund.
    Fail { failed_items: Vec<ItemId> },
    /// Some items failed: refund the charged ones and compensate.
    Compensate {
        failed_items: Vec<ItemId>,
        to_refund: Vec<ItemId>,
    },
}

impl Resolution {
    /// Tallies the bill's item statuses after the charge barrier.
    pub fn from_bill(bill: &Bill) -> Self {
        let failed_items = bill.failed_item_ids();
        let total = bill.item_count();

        if failed_items.is_empty() {
            Resolution::Settle
        } else if failed_items.len() == total {
            Resolution::Fail { failed_items }
        } else {
            let to_refund = bill.charged_items().map(|item| item.id.clone()).collect();
            Resolution::Compensate {
                failed_items,
                to_refund,
            }
        }
    }

    /// Returns the name of the resolution.
    pub fn kind(&self) -> &'static str {
        match self {
            Resolution::Settle => "Settled",
            Resolution::Fail { .. } => "ChargeFailed",
            Resolution::Compensate { .. } => "ChargeCompensated",
        }
    }
}

/// Re-derives the outcome of a bill that is already terminal.
///
/// Used when a workflow is resumed from a terminal snapshot: the caller sees
/// the same result the original run produced, and nothing is executed again.
pub fn terminal_outcome(bill: &Bill) -> Result<BillStatus, BillingError> {
    match bill.status() {
        status @ (BillStatus::Settled | BillStatus::Canceled | BillStatus::Expired) => Ok(status),
        BillStatus::Failed => Err(BillingError::ChargeFailed {
            failed_items: bill.failed_item_ids(),
        }),
        BillStatus::Compensated => Err(BillingError::ChargeCompensated {
            failed_items: bill.failed_item_ids(),
            refunded: bill.count_with_status(ItemStatus::Refunded),
        }),
        status => Err(BillingError::InvalidState { status }),
    }
}
