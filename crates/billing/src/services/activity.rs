//! Payment activity trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::BillId;
use domain::{ItemId, LineItem};
use tokio::sync::RwLock;

use crate::error::ActivityError;

/// Item name the in-memory executor always declines.
pub const DECLINED_ITEM_NAME: &str = "FAIL";

/// Performs the charge and refund for a single line item.
///
/// Implementations must be idempotent per `(bill_id, item.id)`: charging or
/// refunding the same item of the same bill twice has the effect of doing it once.
#[async_trait]
pub trait ActivityExecutor: Send + Sync {
    /// Charges one item.
    async fn charge(&self, bill_id: BillId, item: &LineItem) -> Result<(), ActivityError>;

    /// Refunds a previously charged item. Failures are the implementation's to report.
    async fn refund(&self, bill_id: BillId, item: &LineItem);
}

type ItemKey = (BillId, ItemId);

#[derive(Debug, Default)]
struct InMemoryActivityState {
    charged: HashSet<ItemKey>,
    refunded: HashSet<ItemKey>,
    attempts: HashMap<ItemKey, u32>,
    always_fail: HashSet<ItemId>,
    transient_failures: HashMap<ItemId, u32>,
    unavailable: bool,
}

/// In-memory payment activities for tests and the demo server.
///
/// Items named `FAIL` are always declined. Further failures can be scripted
/// per item identifier.
#[derive(Debug, Clone, Default)]
pub struct InMemoryActivityExecutor {
    state: Arc<RwLock<InMemoryActivityState>>,
}

impl InMemoryActivityExecutor {
    /// Creates a new in-memory executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declines every charge of items with this identifier.
    pub async fn set_always_fail(&self, item_id: impl Into<ItemId>) {
        self.state.write().await.always_fail.insert(item_id.into());
    }

    /// Fails the next `failures` charges of items with this identifier.
    pub async fn set_transient_failures(&self, item_id: impl Into<ItemId>, failures: u32) {
        self.state
            .write()
            .await
            .transient_failures
            .insert(item_id.into(), failures);
    }

    /// Makes every charge fail as if the provider were down.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Returns the number of distinct items charged.
    pub async fn charge_count(&self) -> usize {
        self.state.read().await.charged.len()
    }

    /// Returns the number of distinct items refunded.
    pub async fn refund_count(&self) -> usize {
        self.state.read().await.refunded.len()
    }

    /// Returns how many times a charge of this item was attempted.
    pub async fn attempts(&self, bill_id: BillId, item_id: &str) -> u32 {
        let key = (bill_id, ItemId::new(item_id));
        self.state
            .read()
            .await
            .attempts
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    /// Returns true if the item was charged and not refunded.
    pub async fn is_charged(&self, bill_id: BillId, item_id: &str) -> bool {
        let key = (bill_id, ItemId::new(item_id));
        let state = self.state.read().await;
        state.charged.contains(&key) && !state.refunded.contains(&key)
    }

    /// Returns true if the item was refunded.
    pub async fn is_refunded(&self, bill_id: BillId, item_id: &str) -> bool {
        let key = (bill_id, ItemId::new(item_id));
        self.state.read().await.refunded.contains(&key)
    }
}

#[async_trait]
impl ActivityExecutor for InMemoryActivityExecutor {
    async fn charge(&self, bill_id: BillId, item: &LineItem) -> Result<(), ActivityError> {
        let mut state = self.state.write().await;
        let key = (bill_id, item.id.clone());
        *state.attempts.entry(key.clone()).or_insert(0) += 1;

        if state.charged.contains(&key) {
            tracing::debug!(%bill_id, item_id = %item.id, "item already charged, skipping");
            return Ok(());
        }

        if state.unavailable {
            return Err(ActivityError::Unavailable("provider offline".to_string()));
        }

        if item.name == DECLINED_ITEM_NAME || state.always_fail.contains(&item.id) {
            return Err(ActivityError::Declined {
                item_id: item.id.clone(),
                reason: "payment declined".to_string(),
            });
        }

        if let Some(remaining) = state
            .transient_failures
            .get_mut(&item.id)
            .filter(|remaining| **remaining > 0)
        {
            *remaining -= 1;
            return Err(ActivityError::Unavailable("transient failure".to_string()));
        }

        state.charged.insert(key);
        Ok(())
    }

    async fn refund(&self, bill_id: BillId, item: &LineItem) {
        let mut state = self.state.write().await;
        let key = (bill_id, item.id.clone());

        if !state.charged.contains(&key) {
            tracing::warn!(%bill_id, item_id = %item.id, "refund requested for uncharged item");
            return;
        }
        state.refunded.insert(key);
    }
}
