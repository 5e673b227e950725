//! The per-bill workflow.
//!
//! ```text
//!            add-item (accepted or rejected, stays Open)
//!              ┌──┐
//!              │  ▼
//!           ┌──────┐ charge ┌──────────┐ barrier ┌──────────┬──────────┬─────────────┐
//!           │ Open │───────►│ Charging │────────►│ Settled  │  Failed  │ Compensated │
//!           └──────┘        └──────────┘         └──────────┴──────────┴─────────────┘
//!            │    │
//!     cancel │    │ deadline
//!            ▼    ▼
//!     ┌──────────┐ ┌─────────┐
//!     │ Canceled │ │ Expired │
//!     └──────────┘ └─────────┘
//! ```
//!
//! While open, simultaneous stimuli are taken in the fixed order
//! add-item, charge, cancel, deadline.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{BillId, Currency};
use domain::{Aggregate, Bill, BillError, BillEvent, BillStatus, ItemStatus, LineItem};
use tokio::sync::watch;

use crate::charge::ChargeCoordinator;
use crate::compensation::CompensationCoordinator;
use crate::error::BillingError;
use crate::handle::{BillHandle, Outcome, Reply, SignalReceivers, signal_channels};
use crate::query::{self, QueryPublisher};
use crate::resolution::{self, Resolution};
use crate::retry::Sleeper;
use crate::services::{ActivityExecutor, Ledger};
use crate::settings::WorkflowSettings;

/// Drives one bill from open to a terminal status.
///
/// The workflow is the only writer of its [`Bill`]. Run it with
/// [`BillWorkflow::run`], usually on its own task, and talk to it through the
/// [`BillHandle`] returned alongside it.
pub struct BillWorkflow<A, L> {
    bill: Bill,
    executor: A,
    ledger: L,
    settings: WorkflowSettings,
    sleeper: Arc<dyn Sleeper>,
    signals: SignalReceivers,
    query: QueryPublisher,
    outcome: watch::Sender<Outcome>,
}

impl<A, L> BillWorkflow<A, L>
where
    A: ActivityExecutor,
    L: Ledger,
{
    /// Opens a new bill and returns its workflow and handle.
    pub fn open(
        bill_id: BillId,
        currency: Currency,
        deadline: DateTime<Utc>,
        executor: A,
        ledger: L,
        settings: WorkflowSettings,
        sleeper: Arc<dyn Sleeper>,
    ) -> (Self, BillHandle) {
        metrics::counter!("bills_opened_total").increment(1);
        tracing::info!(%bill_id, %currency, %deadline, "bill opened");
        let bill = Bill::open(bill_id, currency, deadline);
        Self::resume(bill, executor, ledger, settings, sleeper)
    }

    /// Restarts orchestration from a previously captured bill.
    ///
    /// An open bill re-enters the signal loop, a charging bill charges only
    /// its still-pending items, and a terminal bill reports its outcome
    /// without touching any collaborator.
    pub fn resume(
        bill: Bill,
        executor: A,
        ledger: L,
        settings: WorkflowSettings,
        sleeper: Arc<dyn Sleeper>,
    ) -> (Self, BillHandle) {
        let (senders, signals) = signal_channels(settings.signal_buffer);
        let (query, reader) = query::channel(&bill);
        let (outcome, outcome_rx) = watch::channel(None);
        let handle = BillHandle::new(bill.id(), senders, reader, outcome_rx);

        let workflow = Self {
            bill,
            executor,
            ledger,
            settings,
            sleeper,
            signals,
            query,
            outcome,
        };
        (workflow, handle)
    }

    /// Runs the workflow to completion and publishes the outcome to every handle.
    #[tracing::instrument(skip(self), fields(bill_id = %self.bill.id()))]
    pub async fn run(mut self) -> Result<BillStatus, BillingError> {
        let outcome = self.drive().await;

        match &outcome {
            Ok(status) => tracing::info!(%status, "bill workflow finished"),
            Err(err) if err.is_fatal() => tracing::error!(error = %err, "bill workflow aborted"),
            Err(err) => tracing::warn!(kind = err.kind(), error = %err, "bill workflow finished"),
        }

        self.outcome.send_replace(Some(outcome.clone()));
        outcome
    }

    async fn drive(&mut self) -> Result<BillStatus, BillingError> {
        if self.bill.is_terminal() {
            self.close_signals();
            return resolution::terminal_outcome(&self.bill);
        }

        if self.bill.status() == BillStatus::Open {
            self.event_loop().await;
        }
        self.close_signals();

        match self.bill.status() {
            status @ (BillStatus::Canceled | BillStatus::Expired) => Ok(status),
            BillStatus::Charging => {
                self.charge_pending().await;
                self.resolve().await
            }
            status => Err(BillingError::InvalidState { status }),
        }
    }

    /// Processes signals one at a time until the bill leaves Open.
    async fn event_loop(&mut self) {
        let deadline = tokio::time::sleep(self.until_deadline());
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                Some((item, reply)) = self.signals.add_item.recv() => {
                    let result = self.handle_add_item(item);
                    let _ = reply.send(result);
                }
                Some(reply) = self.signals.charge.recv() => {
                    let result = self.handle_charge();
                    let accepted = result.is_ok();
                    let _ = reply.send(result);
                    if accepted {
                        break;
                    }
                }
                Some(reply) = self.signals.cancel.recv() => {
                    let result = self.handle_cancel();
                    let accepted = result.is_ok();
                    let _ = reply.send(result);
                    if accepted {
                        break;
                    }
                }
                () = &mut deadline => {
                    self.handle_deadline();
                    break;
                }
            }
        }
    }

    fn until_deadline(&self) -> Duration {
        (self.bill.deadline() - Utc::now())
            .to_std()
            .unwrap_or_default()
    }

    fn handle_add_item(&mut self, item: LineItem) -> Result<(), BillError> {
        let item_id = item.id.clone();
        match self.bill.execute(|bill| bill.add_item(item)) {
            Ok(_) => {
                metrics::counter!("bill_items_added_total").increment(1);
                tracing::info!(%item_id, total = %self.bill.total(), "item added");
                self.query.publish(&self.bill);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%item_id, error = %err, "add-item signal rejected");
                Err(err)
            }
        }
    }

    fn handle_charge(&mut self) -> Result<(), BillError> {
        match self.bill.execute(Bill::begin_charge) {
            Ok(_) => {
                tracing::info!(pending = self.bill.pending_count(), "charge started");
                self.query.publish(&self.bill);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "charge signal ignored");
                Err(err)
            }
        }
    }

    fn handle_cancel(&mut self) -> Result<(), BillError> {
        match self.bill.execute(Bill::cancel) {
            Ok(_) => {
                metrics::counter!("bills_canceled_total").increment(1);
                tracing::info!(items = self.bill.item_count(), "bill canceled");
                self.query.publish(&self.bill);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "cancel signal rejected");
                Err(err)
            }
        }
    }

    fn handle_deadline(&mut self) {
        let events = self.bill.expire();
        self.bill.apply_events(events);
        metrics::counter!("bills_expired_total").increment(1);
        tracing::info!(items = self.bill.item_count(), "bill expired");
        self.query.publish(&self.bill);
    }

    /// Stops accepting signals and rejects whatever is still queued.
    fn close_signals(&mut self) {
        let status = self.bill.status();
        self.signals.add_item.close();
        self.signals.charge.close();
        self.signals.cancel.close();

        while let Ok((item, reply)) = self.signals.add_item.try_recv() {
            tracing::warn!(item_id = %item.id, %status, "add-item signal arrived after close");
            reject(reply, BillError::NotOpen { status });
        }
        while let Ok(reply) = self.signals.charge.try_recv() {
            reject(reply, BillError::NotOpen { status });
        }
        while let Ok(reply) = self.signals.cancel.try_recv() {
            reject(reply, BillError::CannotCancel { status });
        }
    }

    /// Charges every pending item and waits for all of them.
    async fn charge_pending(&mut self) {
        let bill_id = self.bill.id();
        let pending: Vec<LineItem> = self.bill.pending_items().cloned().collect();

        let coordinator = ChargeCoordinator::new(
            &self.executor,
            &self.settings.retry,
            self.sleeper.as_ref(),
        );
        let bill = &mut self.bill;
        let query = &self.query;

        let tally = coordinator
            .run(bill_id, pending, |outcome| {
                if let Err(err) = outcome.apply_to(bill) {
                    tracing::error!(
                        item_id = %outcome.item_id,
                        error = %err,
                        "charge outcome not applied"
                    );
                }
                query.publish(bill);
            })
            .await;

        tracing::info!(
            charged = tally.charged,
            failed = tally.failed,
            "charge barrier reached"
        );
    }

    async fn resolve(&mut self) -> Result<BillStatus, BillingError> {
        let resolution = Resolution::from_bill(&self.bill);
        tracing::info!(resolution = resolution.kind(), "resolving bill");

        match resolution {
            Resolution::Settle => {
                self.finish(Bill::settle)?;
                self.query.publish(&self.bill);
                metrics::counter!("bills_settled_total").increment(1);

                let (bill_id, total, currency) =
                    (self.bill.id(), self.bill.total(), self.bill.currency());
                if let Err(err) = self.ledger.credit(bill_id, total, currency).await {
                    tracing::warn!(error = %err, %total, %currency, "ledger credit failed");
                }
                Ok(BillStatus::Settled)
            }
            Resolution::Fail { failed_items } => {
                self.finish(Bill::fail)?;
                self.query.publish(&self.bill);
                metrics::counter!("bills_failed_total").increment(1);
                Err(BillingError::ChargeFailed { failed_items })
            }
            Resolution::Compensate {
                failed_items,
                to_refund,
            } => {
                let items: Vec<LineItem> = to_refund
                    .iter()
                    .filter_map(|item_id| self.bill.item(item_id).cloned())
                    .collect();
                self.refund(items).await;

                self.finish(Bill::compensate)?;
                self.query.publish(&self.bill);
                metrics::counter!("bills_compensated_total").increment(1);
                Err(BillingError::ChargeCompensated {
                    failed_items,
                    refunded: self.bill.count_with_status(ItemStatus::Refunded),
                })
            }
        }
    }

    /// Moves a charging bill to its terminal status.
    ///
    /// Resolution only runs from Charging, so a rejection here is fatal.
    fn finish<F>(&mut self, command: F) -> Result<(), BillingError>
    where
        F: FnOnce(&Bill) -> Result<Vec<BillEvent>, BillError>,
    {
        match self.bill.execute(command) {
            Ok(_) => Ok(()),
            Err(err) => {
                let status = self.bill.status();
                tracing::error!(%status, error = %err, "terminal transition rejected");
                Err(BillingError::InvalidState { status })
            }
        }
    }

    async fn refund(&mut self, items: Vec<LineItem>) {
        let bill_id = self.bill.id();
        let coordinator = CompensationCoordinator::new(&self.executor);
        let bill = &mut self.bill;
        let query = &self.query;

        coordinator
            .run(bill_id, items, |item_id| {
                if let Err(err) = bill.execute(|b| b.mark_item_refunded(&item_id)) {
                    tracing::error!(%item_id, error = %err, "refund not applied");
                }
                query.publish(bill);
            })
            .await;
    }
}

fn reject(reply: Reply, err: BillError) {
    let _ = reply.send(Err(err));
}
