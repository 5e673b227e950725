//! Point-in-time copy of a bill for readers.

use chrono::{DateTime, Utc};
use common::{BillId, Currency};
use serde::{Deserialize, Serialize};

use super::{BillStatus, ItemId, ItemStatus, LineItem, Money};

/// An owned, independently mutable copy of a bill's state.
///
/// Snapshots are what queries return and what a restarted workflow resumes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillSnapshot {
    /// Bill identifier.
    pub id: BillId,

    /// Current status.
    pub status: BillStatus,

    /// Bill currency.
    pub currency: Currency,

    /// Gross total of every item ever added.
    pub total: Money,

    /// Instant after which an open bill expires.
    pub deadline: DateTime<Utc>,

    /// Items in insertion order.
    pub items: Vec<LineItem>,
}

impl BillSnapshot {
    /// Returns an item by identifier.
    pub fn item(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id.as_str() == item_id)
    }

    /// Returns the identifiers of items in the given status, in insertion order.
    pub fn item_ids_with_status(&self, status: ItemStatus) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.status == status)
            .map(|item| item.id.clone())
            .collect()
    }

    /// Returns the number of pending items.
    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_pending()).count()
    }

    /// Returns true if the bill reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
