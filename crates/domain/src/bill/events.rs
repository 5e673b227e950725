//! Bill domain events.

use chrono::{DateTime, Utc};
use common::{BillId, Currency};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{ItemId, LineItem, Money};

/// Events that can occur on a bill aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BillEvent {
    /// Bill was opened with a currency and deadline.
    BillOpened(BillOpenedData),

    /// Line item was added.
    ItemAdded(ItemAddedData),

    /// Charging was requested.
    ChargeStarted(ChargeStartedData),

    /// A line item was charged.
    ItemCharged(ItemData),

    /// A line item failed to charge after every retry.
    ItemChargeFailed(ItemChargeFailedData),

    /// A charged line item was refunded.
    ItemRefunded(ItemData),

    /// Bill was canceled while open.
    BillCanceled(ClosedData),

    /// Bill deadline passed while open.
    BillExpired(ClosedData),

    /// Every item was charged.
    BillSettled(ClosedData),

    /// Every item failed to charge.
    BillFailed(ChargeOutcomeData),

    /// Some items failed and the charged ones were refunded.
    BillCompensated(ChargeOutcomeData),
}

impl DomainEvent for BillEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BillEvent::BillOpened(_) => "BillOpened",
            BillEvent::ItemAdded(_) => "ItemAdded",
            BillEvent::ChargeStarted(_) => "ChargeStarted",
            BillEvent::ItemCharged(_) => "ItemCharged",
            BillEvent::ItemChargeFailed(_) => "ItemChargeFailed",
            BillEvent::ItemRefunded(_) => "ItemRefunded",
            BillEvent::BillCanceled(_) => "BillCanceled",
            BillEvent::BillExpired(_) => "BillExpired",
            BillEvent::BillSettled(_) => "BillSettled",
            BillEvent::BillFailed(_) => "BillFailed",
            BillEvent::BillCompensated(_) => "BillCompensated",
        }
    }
}

/// Data for BillOpened event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillOpenedData {
    /// The unique bill ID.
    pub bill_id: BillId,

    /// Currency every item is billed in.
    pub currency: Currency,

    /// Instant after which an open bill expires.
    pub deadline: DateTime<Utc>,

    /// When the bill was opened.
    pub opened_at: DateTime<Utc>,
}

/// Data for ItemAdded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAddedData {
    /// Item identifier.
    pub item_id: ItemId,

    /// Item name.
    pub name: String,

    /// Item amount in minor units.
    pub amount: Money,
}

/// Data for ChargeStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeStartedData {
    /// Number of pending items handed to the charge step.
    pub pending_items: usize,

    /// When charging started.
    pub started_at: DateTime<Utc>,
}

/// Data for per-item events that only name the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    /// Item identifier.
    pub item_id: ItemId,
}

/// Data for ItemChargeFailed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemChargeFailedData {
    /// Item identifier.
    pub item_id: ItemId,

    /// Last error reported by the charge activity.
    pub reason: String,
}

/// Data for events that close an open or charging bill without item detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedData {
    /// When the bill was closed.
    pub closed_at: DateTime<Utc>,
}

/// Data for BillFailed and BillCompensated events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeOutcomeData {
    /// Items whose charge failed.
    pub failed_items: Vec<ItemId>,

    /// When the outcome was recorded.
    pub resolved_at: DateTime<Utc>,
}

// Convenience constructors for events
impl BillEvent {
    /// Creates a BillOpened event.
    pub fn bill_opened(bill_id: BillId, currency: Currency, deadline: DateTime<Utc>) -> Self {
        BillEvent::BillOpened(BillOpenedData {
            bill_id,
            currency,
            deadline,
            opened_at: Utc::now(),
        })
    }

    /// Creates an ItemAdded event.
    pub fn item_added(item: &LineItem) -> Self {
        BillEvent::ItemAdded(ItemAddedData {
            item_id: item.id.clone(),
            name: item.name.clone(),
            amount: item.amount,
        })
    }

    /// Creates a ChargeStarted event.
    pub fn charge_started(pending_items: usize) -> Self {
        BillEvent::ChargeStarted(ChargeStartedData {
            pending_items,
            started_at: Utc::now(),
        })
    }

    /// Creates an ItemCharged event.
    pub fn item_charged(item_id: ItemId) -> Self {
        BillEvent::ItemCharged(ItemData { item_id })
    }

    /// Creates an ItemChargeFailed event.
    pub fn item_charge_failed(item_id: ItemId, reason: impl Into<String>) -> Self {
        BillEvent::ItemChargeFailed(ItemChargeFailedData {
            item_id,
            reason: reason.into(),
        })
    }

    /// Creates an ItemRefunded event.
    pub fn item_refunded(item_id: ItemId) -> Self {
        BillEvent::ItemRefunded(ItemData { item_id })
    }

    /// Creates a BillCanceled event.
    pub fn bill_canceled() -> Self {
        BillEvent::BillCanceled(ClosedData {
            closed_at: Utc::now(),
        })
    }

    /// Creates a BillExpired event.
    pub fn bill_expired() -> Self {
        BillEvent::BillExpired(ClosedData {
            closed_at: Utc::now(),
        })
    }

    /// Creates a BillSettled event.
    pub fn bill_settled() -> Self {
        BillEvent::BillSettled(ClosedData {
            closed_at: Utc::now(),
        })
    }

    /// Creates a BillFailed event.
    pub fn bill_failed(failed_items: Vec<ItemId>) -> Self {
        BillEvent::BillFailed(ChargeOutcomeData {
            failed_items,
            resolved_at: Utc::now(),
        })
    }

    /// Creates a BillCompensated event.
    pub fn bill_compensated(failed_items: Vec<ItemId>) -> Self {
        BillEvent::BillCompensated(ChargeOutcomeData {
            failed_items,
            resolved_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types() {
        assert_eq!(BillEvent::bill_canceled().event_type(), "BillCanceled");
        assert_eq!(
            BillEvent::item_charge_failed(ItemId::new("bad"), "declined").event_type(),
            "ItemChargeFailed"
        );
        assert_eq!(
            BillEvent::bill_compensated(vec![]).event_type(),
            "BillCompensated"
        );
    }

    #[test]
    fn test_item_added_copies_item_fields() {
        let item = LineItem::new("a1", "Book", Money::from_minor(1500));
        let BillEvent::ItemAdded(data) = BillEvent::item_added(&item) else {
            panic!("expected ItemAdded");
        };
        assert_eq!(data.item_id, "a1");
        assert_eq!(data.name, "Book");
        assert_eq!(data.amount, Money::from_minor(1500));
    }

    #[test]
    fn test_serialization_is_adjacently_tagged() {
        let event = BillEvent::item_refunded(ItemId::new("ok"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ItemRefunded");
        assert_eq!(json["data"]["item_id"], "ok");

        let back: BillEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.event_type(), "ItemRefunded");
    }
}
