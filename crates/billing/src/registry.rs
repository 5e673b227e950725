//! Lookup of running bills.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{BillId, Currency};
use domain::Bill;
use tokio::sync::RwLock;

use crate::error::BillingError;
use crate::handle::BillHandle;
use crate::retry::{Sleeper, TokioSleeper};
use crate::services::{ActivityExecutor, Ledger};
use crate::settings::WorkflowSettings;
use crate::workflow::BillWorkflow;

/// Starts bill workflows and keeps their handles by bill identifier.
///
/// Every workflow runs on its own tokio task and shares the registry's
/// executor and ledger. Bills share nothing else.
#[derive(Clone)]
pub struct BillRegistry<A, L> {
    executor: A,
    ledger: L,
    settings: WorkflowSettings,
    sleeper: Arc<dyn Sleeper>,
    bills: Arc<RwLock<HashMap<BillId, BillHandle>>>,
}

impl<A, L> BillRegistry<A, L>
where
    A: ActivityExecutor + Clone + 'static,
    L: Ledger + Clone + 'static,
{
    /// Creates a registry whose workflows back off on the tokio timer.
    pub fn new(executor: A, ledger: L, settings: WorkflowSettings) -> Self {
        Self {
            executor,
            ledger,
            settings,
            sleeper: Arc::new(TokioSleeper),
            bills: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replaces the sleeper used between charge retries.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Opens a bill and starts its workflow.
    pub async fn open_bill(&self, currency: Currency, deadline: DateTime<Utc>) -> BillHandle {
        let (workflow, handle) = BillWorkflow::open(
            BillId::new(),
            currency,
            deadline,
            self.executor.clone(),
            self.ledger.clone(),
            self.settings.clone(),
            Arc::clone(&self.sleeper),
        );
        self.start(workflow, handle).await
    }

    /// Restarts the workflow of a previously captured bill.
    ///
    /// Replaces any handle already registered under the same identifier.
    pub async fn resume_bill(&self, bill: Bill) -> BillHandle {
        let (workflow, handle) = BillWorkflow::resume(
            bill,
            self.executor.clone(),
            self.ledger.clone(),
            self.settings.clone(),
            Arc::clone(&self.sleeper),
        );
        self.start(workflow, handle).await
    }

    /// Returns the handle of a bill.
    pub async fn get(&self, bill_id: BillId) -> Result<BillHandle, BillingError> {
        self.bills
            .read()
            .await
            .get(&bill_id)
            .cloned()
            .ok_or(BillingError::BillNotFound(bill_id))
    }

    /// Returns the number of bills ever opened or resumed.
    pub async fn bill_count(&self) -> usize {
        self.bills.read().await.len()
    }

    /// Returns the shared executor.
    pub fn executor(&self) -> &A {
        &self.executor
    }

    /// Returns the shared ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    async fn start(&self, workflow: BillWorkflow<A, L>, handle: BillHandle) -> BillHandle {
        self.bills.write().await.insert(handle.id(), handle.clone());
        tokio::spawn(workflow.run());
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RecordingSleeper;
    use crate::services::{InMemoryActivityExecutor, InMemoryLedger};
    use chrono::Duration;
    use domain::{BillStatus, LineItem, Money};

    fn registry() -> BillRegistry<InMemoryActivityExecutor, InMemoryLedger> {
        BillRegistry::new(
            InMemoryActivityExecutor::new(),
            InMemoryLedger::new(),
            WorkflowSettings::default(),
        )
        .with_sleeper(Arc::new(RecordingSleeper::new()))
    }

    #[tokio::test]
    async fn test_open_and_get() {
        let registry = registry();
        let handle = registry
            .open_bill(Currency::Gel, Utc::now() + Duration::days(30))
            .await;

        let found = registry.get(handle.id()).await.unwrap();
        assert_eq!(found.id(), handle.id());
        assert_eq!(found.status(), BillStatus::Open);
        assert_eq!(registry.bill_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_bill() {
        let registry = registry();
        let id = BillId::new();
        assert!(matches!(
            registry.get(id).await,
            Err(BillingError::BillNotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_bills_are_independent() {
        let registry = registry();
        let deadline = Utc::now() + Duration::days(1);
        let first = registry.open_bill(Currency::Usd, deadline).await;
        let second = registry.open_bill(Currency::Usd, deadline).await;

        first
            .add_item(LineItem::new("same", "Book", Money::from_minor(10)))
            .await
            .unwrap();
        second
            .add_item(LineItem::new("same", "Book", Money::from_minor(20)))
            .await
            .unwrap();
        first.cancel().await.unwrap();

        assert_eq!(first.wait().await, Ok(BillStatus::Canceled));
        assert_eq!(second.status(), BillStatus::Open);
        assert_eq!(second.snapshot().total, Money::from_minor(20));
    }

    #[tokio::test]
    async fn test_settled_bill_credits_shared_ledger() {
        let registry = registry();
        let handle = registry
            .open_bill(Currency::Eur, Utc::now() + Duration::days(1))
            .await;
        handle
            .add_item(LineItem::new("a", "Book", Money::from_minor(250)))
            .await
            .unwrap();
        handle.charge().await.unwrap();

        assert_eq!(handle.wait().await, Ok(BillStatus::Settled));
        assert_eq!(
            registry.ledger().balance(Currency::Eur).await,
            Money::from_minor(250)
        );
    }
}
