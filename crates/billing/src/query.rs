//! Read side of a running bill.
//!
//! The workflow publishes a full [`BillSnapshot`] after every mutation. Readers
//! clone the latest published value, so they never see a half-applied change
//! and never block the workflow.

use domain::{Bill, BillSnapshot};
use tokio::sync::watch;

/// Write half, owned by the workflow.
#[derive(Debug)]
pub struct QueryPublisher {
    tx: watch::Sender<BillSnapshot>,
}

/// Read half. Cheap to clone; keeps answering after the workflow finished.
#[derive(Debug, Clone)]
pub struct BillQuery {
    rx: watch::Receiver<BillSnapshot>,
}

/// Creates a publisher seeded with the bill's current state.
pub fn channel(bill: &Bill) -> (QueryPublisher, BillQuery) {
    let (tx, rx) = watch::channel(bill.snapshot());
    (QueryPublisher { tx }, BillQuery { rx })
}

impl QueryPublisher {
    /// Replaces the published snapshot with the bill's current state.
    pub fn publish(&self, bill: &Bill) {
        self.tx.send_replace(bill.snapshot());
    }

    /// Creates another reader.
    pub fn subscribe(&self) -> BillQuery {
        BillQuery {
            rx: self.tx.subscribe(),
        }
    }
}

impl BillQuery {
    /// Returns an owned copy of the latest published state.
    pub fn snapshot(&self) -> BillSnapshot {
        self.rx.borrow().clone()
    }

    /// Waits until a published snapshot satisfies `predicate` and returns it.
    ///
    /// Returns `None` if the workflow finished without ever publishing a match.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&BillSnapshot) -> bool,
    ) -> Option<BillSnapshot> {
        match self.rx.wait_for(|snapshot| predicate(snapshot)).await {
            Ok(snapshot) => Some(snapshot.clone()),
            Err(_) => None,
        }
    }
}
