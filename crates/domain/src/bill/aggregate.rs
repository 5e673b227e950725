//! Bill aggregate implementation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{BillId, Currency};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{
    BillError, BillEvent, BillSnapshot, BillStatus, ItemId, ItemStatus, LineItem, Money,
    events::{BillOpenedData, ItemAddedData},
};

/// Bill aggregate root.
///
/// Tracks the line items of one billing cycle from opening until the bill is
/// settled, failed, compensated, canceled or expired. Items keep insertion order
/// and are never removed; `total` is the gross amount of every item ever added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    /// Unique bill identifier.
    id: BillId,

    /// Currency of every item on the bill. Fixed at creation.
    currency: Currency,

    /// Instant after which an open bill expires.
    deadline: DateTime<Utc>,

    /// Current status of the bill.
    status: BillStatus,

    /// Items in insertion order.
    items: Vec<LineItem>,

    /// Gross total of all items.
    total: Money,
}

impl Aggregate for Bill {
    type Event = BillEvent;
    type Error = BillError;

    fn aggregate_type() -> &'static str {
        "Bill"
    }

    fn id(&self) -> BillId {
        self.id
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            BillEvent::BillOpened(data) => self.apply_bill_opened(data),
            BillEvent::ItemAdded(data) => self.apply_item_added(data),
            BillEvent::ChargeStarted(_) => {
                self.status = BillStatus::Charging;
            }
            BillEvent::ItemCharged(data) => self.set_item_status(&data.item_id, ItemStatus::Charged),
            BillEvent::ItemChargeFailed(data) => {
                self.set_item_status(&data.item_id, ItemStatus::Failed)
            }
            BillEvent::ItemRefunded(data) => {
                self.set_item_status(&data.item_id, ItemStatus::Refunded)
            }
            BillEvent::BillCanceled(_) => self.close_pending(BillStatus::Canceled),
            BillEvent::BillExpired(_) => self.close_pending(BillStatus::Expired),
            BillEvent::BillSettled(_) => {
                self.status = BillStatus::Settled;
            }
            BillEvent::BillFailed(_) => {
                self.status = BillStatus::Failed;
            }
            BillEvent::BillCompensated(_) => {
                self.status = BillStatus::Compensated;
            }
        }
    }
}

// Construction
impl Bill {
    /// Opens a new, empty bill.
    pub fn open(id: BillId, currency: Currency, deadline: DateTime<Utc>) -> Self {
        Self::from_opened(BillOpenedData {
            bill_id: id,
            currency,
            deadline,
            opened_at: Utc::now(),
        })
    }

    /// Rebuilds a bill from its full event history.
    ///
    /// The first event must be `BillOpened`; a later `BillOpened` is ignored.
    pub fn replay(events: impl IntoIterator<Item = BillEvent>) -> Result<Self, BillError> {
        let mut events = events.into_iter();
        let mut bill = match events.next() {
            Some(BillEvent::BillOpened(data)) => Self::from_opened(data),
            _ => return Err(BillError::MissingOpenEvent),
        };
        bill.apply_events(events);
        Ok(bill)
    }

    /// Restores a bill from a snapshot.
    ///
    /// The snapshot is checked the way `add_item` checks items, and every
    /// item status must be one the bill status can hold. The total is
    /// recomputed from the items.
    pub fn restore(snapshot: BillSnapshot) -> Result<Self, BillError> {
        let mut seen = HashSet::with_capacity(snapshot.items.len());
        let mut total = Money::zero();

        for item in &snapshot.items {
            if item.id.is_blank() {
                return Err(BillError::EmptyItemId);
            }
            if item.name.trim().is_empty() {
                return Err(BillError::EmptyItemName);
            }
            if !item.amount.is_positive() {
                return Err(BillError::InvalidAmount {
                    amount: item.amount.minor_units(),
                });
            }
            if !seen.insert(&item.id) {
                return Err(BillError::DuplicateItem {
                    item_id: item.id.clone(),
                });
            }
            if !snapshot.status.can_hold_item(item.status) {
                return Err(BillError::InconsistentItemStatus {
                    item_id: item.id.clone(),
                    item_status: item.status,
                    bill_status: snapshot.status,
                });
            }
            total = total
                .checked_add(item.amount)
                .ok_or(BillError::TotalOverflow)?;
        }

        if snapshot.status == BillStatus::Charging && snapshot.items.is_empty() {
            return Err(BillError::NoPendingItems);
        }

        Ok(Self {
            id: snapshot.id,
            currency: snapshot.currency,
            deadline: snapshot.deadline,
            status: snapshot.status,
            items: snapshot.items,
            total,
        })
    }

    fn from_opened(data: BillOpenedData) -> Self {
        Self {
            id: data.bill_id,
            currency: data.currency,
            deadline: data.deadline,
            status: BillStatus::Open,
            items: Vec::new(),
            total: Money::zero(),
        }
    }
}

// Query methods
impl Bill {
    /// Returns the bill currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns the expiry deadline.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Returns the current status.
    pub fn status(&self) -> BillStatus {
        self.status
    }

    /// Returns all items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns an item by identifier.
    pub fn item(&self, item_id: &ItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }

    /// Returns the number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the gross total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the number of items in the given status.
    pub fn count_with_status(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }

    /// Returns the number of pending items.
    pub fn pending_count(&self) -> usize {
        self.count_with_status(ItemStatus::Pending)
    }

    /// Returns the pending items in insertion order.
    pub fn pending_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|item| item.status == ItemStatus::Pending)
    }

    /// Returns the charged items in insertion order.
    pub fn charged_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|item| item.status == ItemStatus::Charged)
    }

    /// Returns the identifiers of failed items in insertion order.
    pub fn failed_item_ids(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.status == ItemStatus::Failed)
            .map(|item| item.id.clone())
            .collect()
    }

    /// Returns true if the bill is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns an owned copy of the current state.
    pub fn snapshot(&self) -> BillSnapshot {
        BillSnapshot {
            id: self.id,
            status: self.status,
            currency: self.currency,
            total: self.total,
            deadline: self.deadline,
            items: self.items.clone(),
        }
    }
}

// Command methods (return events)
impl Bill {
    /// Adds a pending item to the bill.
    ///
    /// The status carried by `item` is ignored; new items always start pending.
    pub fn add_item(&self, item: LineItem) -> Result<Vec<BillEvent>, BillError> {
        if !self.status.can_add_items() {
            return Err(BillError::NotOpen {
                status: self.status,
            });
        }

        if item.id.is_blank() {
            return Err(BillError::EmptyItemId);
        }

        if item.name.trim().is_empty() {
            return Err(BillError::EmptyItemName);
        }

        if !item.amount.is_positive() {
            return Err(BillError::InvalidAmount {
                amount: item.amount.minor_units(),
            });
        }

        if self.item(&item.id).is_some() {
            return Err(BillError::DuplicateItem { item_id: item.id });
        }

        if self.total.checked_add(item.amount).is_none() {
            return Err(BillError::TotalOverflow);
        }

        Ok(vec![BillEvent::item_added(&item)])
    }

    /// Moves the bill into the charging phase.
    pub fn begin_charge(&self) -> Result<Vec<BillEvent>, BillError> {
        if !self.status.can_begin_charge() {
            return Err(BillError::NotOpen {
                status: self.status,
            });
        }

        let pending = self.pending_count();
        if pending == 0 {
            return Err(BillError::NoPendingItems);
        }

        Ok(vec![BillEvent::charge_started(pending)])
    }

    /// Cancels an open bill and every pending item on it.
    pub fn cancel(&self) -> Result<Vec<BillEvent>, BillError> {
        if !self.status.can_cancel() {
            return Err(BillError::CannotCancel {
                status: self.status,
            });
        }

        Ok(vec![BillEvent::bill_canceled()])
    }

    /// Expires the bill and cancels every pending item.
    ///
    /// Has no error path: the workflow only fires the deadline while the bill is open.
    pub fn expire(&self) -> Vec<BillEvent> {
        vec![BillEvent::bill_expired()]
    }

    /// Records a successful charge for a pending item.
    pub fn mark_item_charged(&self, item_id: &ItemId) -> Result<Vec<BillEvent>, BillError> {
        self.check_item_transition(item_id, ItemStatus::Charged, "record a charge")?;
        Ok(vec![BillEvent::item_charged(item_id.clone())])
    }

    /// Records a terminal charge failure for a pending item.
    pub fn mark_item_failed(
        &self,
        item_id: &ItemId,
        reason: impl Into<String>,
    ) -> Result<Vec<BillEvent>, BillError> {
        self.check_item_transition(item_id, ItemStatus::Failed, "record a charge failure")?;
        Ok(vec![BillEvent::item_charge_failed(item_id.clone(), reason)])
    }

    /// Records a refund for a charged item.
    pub fn mark_item_refunded(&self, item_id: &ItemId) -> Result<Vec<BillEvent>, BillError> {
        self.check_item_transition(item_id, ItemStatus::Refunded, "record a refund")?;
        Ok(vec![BillEvent::item_refunded(item_id.clone())])
    }

    /// Settles a bill whose items were all charged.
    pub fn settle(&self) -> Result<Vec<BillEvent>, BillError> {
        self.check_resolvable("settle")?;
        Ok(vec![BillEvent::bill_settled()])
    }

    /// Fails a bill whose items all failed to charge.
    pub fn fail(&self) -> Result<Vec<BillEvent>, BillError> {
        self.check_resolvable("fail")?;
        Ok(vec![BillEvent::bill_failed(self.failed_item_ids())])
    }

    /// Marks a partially failed bill as compensated.
    pub fn compensate(&self) -> Result<Vec<BillEvent>, BillError> {
        self.check_resolvable("compensate")?;
        Ok(vec![BillEvent::bill_compensated(self.failed_item_ids())])
    }

    fn check_resolvable(&self, action: &'static str) -> Result<(), BillError> {
        if !self.status.can_resolve() {
            return Err(BillError::InvalidTransition {
                current_status: self.status,
                action,
            });
        }
        Ok(())
    }

    fn check_item_transition(
        &self,
        item_id: &ItemId,
        to: ItemStatus,
        action: &'static str,
    ) -> Result<(), BillError> {
        self.check_resolvable(action)?;

        let item = self.item(item_id).ok_or_else(|| BillError::ItemNotFound {
            item_id: item_id.clone(),
        })?;

        if !item.status.can_transition_to(to) {
            return Err(BillError::InvalidItemTransition {
                item_id: item_id.clone(),
                from: item.status,
                to,
            });
        }
        Ok(())
    }
}

// Apply event helpers
impl Bill {
    fn apply_bill_opened(&mut self, data: BillOpenedData) {
        *self = Self::from_opened(data);
    }

    fn apply_item_added(&mut self, data: ItemAddedData) {
        self.total += data.amount;
        self.items
            .push(LineItem::new(data.item_id, data.name, data.amount));
    }

    fn set_item_status(&mut self, item_id: &ItemId, status: ItemStatus) {
        if let Some(item) = self.items.iter_mut().find(|item| &item.id == item_id) {
            item.status = status;
        }
    }

    fn close_pending(&mut self, status: BillStatus) {
        self.status = status;
        for item in &mut self.items {
            if item.status == ItemStatus::Pending {
                item.status = ItemStatus::Canceled;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_bill() -> Bill {
        Bill::open(BillId::new(), Currency::Usd, Utc::now() + Duration::hours(24))
    }

    fn item(id: &str, amount: i64) -> LineItem {
        LineItem::new(id, format!("item {id}"), Money::from_minor(amount))
    }

    fn add(bill: &mut Bill, id: &str, amount: i64) {
        bill.execute(|b| b.add_item(item(id, amount))).unwrap();
    }

    fn charging_bill(ids: &[&str]) -> Bill {
        let mut bill = open_bill();
        for id in ids {
            add(&mut bill, id, 100);
        }
        bill.execute(Bill::begin_charge).unwrap();
        bill
    }

    #[test]
    fn test_open_bill() {
        let id = BillId::new();
        let bill = Bill::open(id, Currency::Eur, Utc::now());
        assert_eq!(bill.id(), id);
        assert_eq!(bill.currency(), Currency::Eur);
        assert_eq!(bill.status(), BillStatus::Open);
        assert_eq!(bill.item_count(), 0);
        assert_eq!(bill.total(), Money::zero());
    }

    #[test]
    fn test_add_item() {
        let mut bill = open_bill();
        let events = bill.execute(|b| b.add_item(item("a1", 1500))).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(bill.item_count(), 1);
        assert_eq!(bill.total().minor_units(), 1500);
        assert_eq!(bill.items()[0].status, ItemStatus::Pending);
    }

    #[test]
    fn test_add_item_forces_pending_status() {
        let mut bill = open_bill();
        let mut charged = item("a1", 10);
        charged.status = ItemStatus::Charged;

        bill.execute(|b| b.add_item(charged)).unwrap();
        assert_eq!(bill.items()[0].status, ItemStatus::Pending);
    }

    #[test]
    fn test_add_items_preserves_order() {
        let mut bill = open_bill();
        for id in ["c", "a", "b"] {
            add(&mut bill, id, 1);
        }
        let ids: Vec<&str> = bill.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn test_duplicate_item_rejected_without_mutation() {
        let mut bill = open_bill();
        add(&mut bill, "dup", 123);

        let result = bill.execute(|b| b.add_item(item("dup", 999)));
        assert_eq!(
            result,
            Err(BillError::DuplicateItem {
                item_id: ItemId::new("dup")
            })
        );
        assert_eq!(bill.item_count(), 1);
        assert_eq!(bill.total().minor_units(), 123);
    }

    #[test]
    fn test_add_item_validation() {
        let bill = open_bill();
        assert_eq!(
            bill.add_item(item("a", 0)),
            Err(BillError::InvalidAmount { amount: 0 })
        );
        assert_eq!(
            bill.add_item(item("a", -5)),
            Err(BillError::InvalidAmount { amount: -5 })
        );
        assert_eq!(bill.add_item(item(" ", 5)), Err(BillError::EmptyItemId));
        assert_eq!(
            bill.add_item(LineItem::new("a", "", Money::from_minor(5))),
            Err(BillError::EmptyItemName)
        );
    }

    #[test]
    fn test_add_item_rejects_total_overflow() {
        let mut bill = open_bill();
        add(&mut bill, "big", i64::MAX);
        assert_eq!(bill.add_item(item("one", 1)), Err(BillError::TotalOverflow));
    }

    #[test]
    fn test_add_item_after_close_fails() {
        let mut bill = open_bill();
        add(&mut bill, "a1", 10);
        bill.execute(Bill::cancel).unwrap();

        let result = bill.execute(|b| b.add_item(item("b2", 10)));
        assert_eq!(
            result,
            Err(BillError::NotOpen {
                status: BillStatus::Canceled
            })
        );
        assert_eq!(bill.item_count(), 1);
        assert_eq!(bill.total().minor_units(), 10);
    }

    #[test]
    fn test_begin_charge() {
        let mut bill = open_bill();
        add(&mut bill, "a1", 10);
        bill.execute(Bill::begin_charge).unwrap();
        assert_eq!(bill.status(), BillStatus::Charging);
    }

    #[test]
    fn test_begin_charge_without_pending_items() {
        let mut bill = open_bill();
        assert_eq!(
            bill.execute(Bill::begin_charge),
            Err(BillError::NoPendingItems)
        );
        assert_eq!(bill.status(), BillStatus::Open);
    }

    #[test]
    fn test_begin_charge_twice_fails() {
        let mut bill = charging_bill(&["a1"]);
        assert_eq!(
            bill.execute(Bill::begin_charge),
            Err(BillError::NotOpen {
                status: BillStatus::Charging
            })
        );
    }

    #[test]
    fn test_cancel_cancels_pending_items() {
        let mut bill = open_bill();
        add(&mut bill, "a", 10);
        add(&mut bill, "b", 20);
        bill.execute(Bill::cancel).unwrap();

        assert_eq!(bill.status(), BillStatus::Canceled);
        assert!(bill.items().iter().all(|i| i.status == ItemStatus::Canceled));
        assert_eq!(bill.total().minor_units(), 30);
    }

    #[test]
    fn test_cancel_leaves_non_pending_items_untouched() {
        let mut bill = open_bill();
        add(&mut bill, "a", 10);
        bill.apply(BillEvent::item_charged(ItemId::new("a")));
        add(&mut bill, "b", 20);

        bill.execute(Bill::cancel).unwrap();
        assert_eq!(bill.items()[0].status, ItemStatus::Charged);
        assert_eq!(bill.items()[1].status, ItemStatus::Canceled);
    }

    #[test]
    fn test_cancel_when_not_open_fails() {
        let mut bill = charging_bill(&["a1"]);
        assert_eq!(
            bill.execute(Bill::cancel),
            Err(BillError::CannotCancel {
                status: BillStatus::Charging
            })
        );
        assert_eq!(bill.status(), BillStatus::Charging);
    }

    #[test]
    fn test_expire_with_items() {
        let mut bill = open_bill();
        add(&mut bill, "a", 10);
        add(&mut bill, "b", 20);
        let events = bill.expire();
        bill.apply_events(events);

        assert_eq!(bill.status(), BillStatus::Expired);
        assert_eq!(bill.count_with_status(ItemStatus::Canceled), 2);
    }

    #[test]
    fn test_expire_empty_bill() {
        let mut bill = open_bill();
        let events = bill.expire();
        bill.apply_events(events);
        assert_eq!(bill.status(), BillStatus::Expired);
        assert_eq!(bill.item_count(), 0);
    }

    #[test]
    fn test_pending_count() {
        let mut bill = open_bill();
        assert_eq!(bill.pending_count(), 0);
        add(&mut bill, "a", 1);
        add(&mut bill, "b", 1);
        assert_eq!(bill.pending_count(), 2);
        bill.execute(Bill::begin_charge).unwrap();
        bill.execute(|b| b.mark_item_charged(&ItemId::new("a"))).unwrap();
        assert_eq!(bill.pending_count(), 1);
    }

    #[test]
    fn test_item_outcomes_follow_transition_table() {
        let mut bill = charging_bill(&["ok", "bad"]);
        let ok = ItemId::new("ok");
        let bad = ItemId::new("bad");

        bill.execute(|b| b.mark_item_charged(&ok)).unwrap();
        bill.execute(|b| b.mark_item_failed(&bad, "declined")).unwrap();

        assert_eq!(
            bill.execute(|b| b.mark_item_refunded(&bad)),
            Err(BillError::InvalidItemTransition {
                item_id: bad.clone(),
                from: ItemStatus::Failed,
                to: ItemStatus::Refunded,
            })
        );
        assert_eq!(
            bill.execute(|b| b.mark_item_charged(&ok)),
            Err(BillError::InvalidItemTransition {
                item_id: ok.clone(),
                from: ItemStatus::Charged,
                to: ItemStatus::Charged,
            })
        );

        bill.execute(|b| b.mark_item_refunded(&ok)).unwrap();
        assert_eq!(bill.item(&ok).unwrap().status, ItemStatus::Refunded);
        assert_eq!(bill.failed_item_ids(), vec![bad]);
    }

    #[test]
    fn test_item_outcome_requires_charging() {
        let mut bill = open_bill();
        add(&mut bill, "a", 1);
        assert!(matches!(
            bill.mark_item_charged(&ItemId::new("a")),
            Err(BillError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_item_outcome_unknown_item() {
        let bill = charging_bill(&["a"]);
        assert_eq!(
            bill.mark_item_charged(&ItemId::new("zzz")),
            Err(BillError::ItemNotFound {
                item_id: ItemId::new("zzz")
            })
        );
    }

    #[test]
    fn test_resolutions_require_charging() {
        let bill = open_bill();
        for result in [bill.settle(), bill.fail(), bill.compensate()] {
            assert!(matches!(result, Err(BillError::InvalidTransition { .. })));
        }
    }

    #[test]
    fn test_settle_and_terminal_immutability() {
        let mut bill = charging_bill(&["a"]);
        bill.execute(|b| b.mark_item_charged(&ItemId::new("a"))).unwrap();
        bill.execute(Bill::settle).unwrap();

        assert!(bill.is_terminal());
        assert!(bill.add_item(item("b", 1)).is_err());
        assert!(bill.begin_charge().is_err());
        assert!(bill.cancel().is_err());
        assert!(bill.settle().is_err());
    }

    #[test]
    fn test_fail_records_failed_items() {
        let mut bill = charging_bill(&["a", "b"]);
        bill.execute(|b| b.mark_item_failed(&ItemId::new("a"), "x")).unwrap();
        bill.execute(|b| b.mark_item_failed(&ItemId::new("b"), "y")).unwrap();

        let events = bill.execute(Bill::fail).unwrap();
        let BillEvent::BillFailed(data) = &events[0] else {
            panic!("expected BillFailed");
        };
        assert_eq!(data.failed_items, vec![ItemId::new("a"), ItemId::new("b")]);
        assert_eq!(bill.status(), BillStatus::Failed);
    }

    #[test]
    fn test_replay_rebuilds_identical_state() {
        let mut bill = open_bill();
        let mut history = vec![BillEvent::bill_opened(
            bill.id(),
            bill.currency(),
            bill.deadline(),
        )];
        history.extend(bill.execute(|b| b.add_item(item("ok", 100))).unwrap());
        history.extend(bill.execute(|b| b.add_item(item("bad", 50))).unwrap());
        history.extend(bill.execute(Bill::begin_charge).unwrap());
        history.extend(bill.execute(|b| b.mark_item_charged(&ItemId::new("ok"))).unwrap());
        history.extend(
            bill.execute(|b| b.mark_item_failed(&ItemId::new("bad"), "declined"))
                .unwrap(),
        );
        history.extend(bill.execute(|b| b.mark_item_refunded(&ItemId::new("ok"))).unwrap());
        history.extend(bill.execute(Bill::compensate).unwrap());

        let replayed = Bill::replay(history).unwrap();
        assert_eq!(replayed.snapshot(), bill.snapshot());
        assert_eq!(replayed.status(), BillStatus::Compensated);
    }

    #[test]
    fn test_replay_requires_open_event() {
        let result = Bill::replay(vec![BillEvent::bill_canceled()]);
        assert!(matches!(result, Err(BillError::MissingOpenEvent)));
        assert!(matches!(
            Bill::replay(Vec::new()),
            Err(BillError::MissingOpenEvent)
        ));
    }

    #[test]
    fn test_restore_recomputes_total() {
        let mut bill = open_bill();
        add(&mut bill, "a", 700);
        add(&mut bill, "b", 300);

        let mut snapshot = bill.snapshot();
        snapshot.total = Money::from_minor(1);

        let restored = Bill::restore(snapshot).unwrap();
        assert_eq!(restored.total().minor_units(), 1000);
        assert_eq!(restored.items(), bill.items());
    }

    #[test]
    fn test_restore_rejects_duplicate_ids() {
        let mut snapshot = open_bill().snapshot();
        snapshot.items = vec![
            LineItem::new("dup", "Book", Money::from_minor(10)),
            LineItem::new("dup", "Pen", Money::from_minor(20)),
        ];

        assert_eq!(
            Bill::restore(snapshot).unwrap_err(),
            BillError::DuplicateItem {
                item_id: ItemId::new("dup")
            }
        );
    }

    #[test]
    fn test_restore_rejects_invalid_items() {
        let mut snapshot = open_bill().snapshot();
        snapshot.items = vec![LineItem::new("neg", "Refund", Money::from_minor(-5))];
        assert_eq!(
            Bill::restore(snapshot.clone()).unwrap_err(),
            BillError::InvalidAmount { amount: -5 }
        );

        snapshot.items = vec![LineItem::new(" ", "Book", Money::from_minor(5))];
        assert_eq!(Bill::restore(snapshot).unwrap_err(), BillError::EmptyItemId);
    }

    #[test]
    fn test_restore_rejects_overflowing_total() {
        let mut snapshot = open_bill().snapshot();
        snapshot.items = vec![
            LineItem::new("a", "Big", Money::from_minor(i64::MAX)),
            LineItem::new("b", "Small", Money::from_minor(1)),
        ];

        assert_eq!(Bill::restore(snapshot).unwrap_err(), BillError::TotalOverflow);
    }

    #[test]
    fn test_restore_rejects_item_status_bill_cannot_hold() {
        let mut bill = open_bill();
        add(&mut bill, "a", 10);

        let mut charged_while_open = bill.snapshot();
        charged_while_open.items[0].status = ItemStatus::Charged;
        assert_eq!(
            Bill::restore(charged_while_open).unwrap_err(),
            BillError::InconsistentItemStatus {
                item_id: ItemId::new("a"),
                item_status: ItemStatus::Charged,
                bill_status: BillStatus::Open,
            }
        );

        bill.execute(Bill::begin_charge).unwrap();
        let mut refunded_while_charging = bill.snapshot();
        refunded_while_charging.items[0].status = ItemStatus::Refunded;
        assert!(matches!(
            Bill::restore(refunded_while_charging),
            Err(BillError::InconsistentItemStatus { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_empty_charging_bill() {
        let mut snapshot = open_bill().snapshot();
        snapshot.status = BillStatus::Charging;
        assert_eq!(Bill::restore(snapshot).unwrap_err(), BillError::NoPendingItems);
    }
}
