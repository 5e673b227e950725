//! Caller side of a bill workflow.

use common::BillId;
use domain::{BillError, BillSnapshot, BillStatus, LineItem};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::BillingError;
use crate::query::BillQuery;

/// Reply channel for a signal.
pub(crate) type Reply = oneshot::Sender<Result<(), BillError>>;

/// Terminal outcome published once by the workflow.
pub(crate) type Outcome = Option<Result<BillStatus, BillingError>>;

/// Receiving ends of the three signal channels, owned by the workflow.
#[derive(Debug)]
pub(crate) struct SignalReceivers {
    pub(crate) add_item: mpsc::Receiver<(LineItem, Reply)>,
    pub(crate) charge: mpsc::Receiver<Reply>,
    pub(crate) cancel: mpsc::Receiver<Reply>,
}

/// Sending ends of the three signal channels.
#[derive(Debug, Clone)]
pub(crate) struct SignalSenders {
    add_item: mpsc::Sender<(LineItem, Reply)>,
    charge: mpsc::Sender<Reply>,
    cancel: mpsc::Sender<Reply>,
}

pub(crate) fn signal_channels(buffer: usize) -> (SignalSenders, SignalReceivers) {
    let buffer = buffer.max(1);
    let (add_item_tx, add_item_rx) = mpsc::channel(buffer);
    let (charge_tx, charge_rx) = mpsc::channel(buffer);
    let (cancel_tx, cancel_rx) = mpsc::channel(buffer);

    (
        SignalSenders {
            add_item: add_item_tx,
            charge: charge_tx,
            cancel: cancel_tx,
        },
        SignalReceivers {
            add_item: add_item_rx,
            charge: charge_rx,
            cancel: cancel_rx,
        },
    )
}

/// Handle to one running bill.
///
/// Every signal waits for the workflow to process it and returns the
/// aggregate's verdict. Cloning is cheap; all clones address the same bill.
#[derive(Debug, Clone)]
pub struct BillHandle {
    id: BillId,
    signals: SignalSenders,
    query: BillQuery,
    outcome: watch::Receiver<Outcome>,
}

impl BillHandle {
    pub(crate) fn new(
        id: BillId,
        signals: SignalSenders,
        query: BillQuery,
        outcome: watch::Receiver<Outcome>,
    ) -> Self {
        Self {
            id,
            signals,
            query,
            outcome,
        }
    }

    /// Returns the bill identifier.
    pub fn id(&self) -> BillId {
        self.id
    }

    /// Asks the workflow to add an item.
    pub async fn add_item(&self, item: LineItem) -> Result<(), BillingError> {
        let (reply, response) = oneshot::channel();
        if self.signals.add_item.send((item, reply)).await.is_err() {
            return Err(BillError::NotOpen {
                status: self.status(),
            }
            .into());
        }
        Self::await_reply(response).await
    }

    /// Asks the workflow to start charging.
    pub async fn charge(&self) -> Result<(), BillingError> {
        let (reply, response) = oneshot::channel();
        if self.signals.charge.send(reply).await.is_err() {
            return Err(BillError::NotOpen {
                status: self.status(),
            }
            .into());
        }
        Self::await_reply(response).await
    }

    /// Asks the workflow to cancel the bill.
    pub async fn cancel(&self) -> Result<(), BillingError> {
        let (reply, response) = oneshot::channel();
        if self.signals.cancel.send(reply).await.is_err() {
            return Err(BillError::CannotCancel {
                status: self.status(),
            }
            .into());
        }
        Self::await_reply(response).await
    }

    /// Returns the latest consistent snapshot of the bill.
    pub fn snapshot(&self) -> BillSnapshot {
        self.query.snapshot()
    }

    /// Returns the current status.
    pub fn status(&self) -> BillStatus {
        self.query.snapshot().status
    }

    /// Returns a reader for the bill state.
    pub fn query(&self) -> BillQuery {
        self.query.clone()
    }

    /// Waits for the workflow to finish and returns its outcome.
    ///
    /// Canceled and expired bills resolve to `Ok`; charge failures resolve to
    /// [`BillingError::ChargeFailed`] or [`BillingError::ChargeCompensated`].
    pub async fn wait(&self) -> Result<BillStatus, BillingError> {
        let mut outcome = self.outcome.clone();
        let published = match outcome.wait_for(Option::is_some).await {
            Ok(published) => published.clone(),
            Err(_) => None,
        };
        published.unwrap_or(Err(BillingError::LoopClosed))
    }

    /// Returns the outcome if the workflow already finished.
    pub fn outcome(&self) -> Option<Result<BillStatus, BillingError>> {
        self.outcome.borrow().clone()
    }

    async fn await_reply(
        response: oneshot::Receiver<Result<(), BillError>>,
    ) -> Result<(), BillingError> {
        response
            .await
            .map_err(|_| BillingError::LoopClosed)?
            .map_err(BillingError::from)
    }
}
