//! Concurrent charging of pending items.

use std::time::Instant;

use common::BillId;
use domain::{Aggregate, Bill, BillError, ItemId, LineItem};
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::error::ActivityError;
use crate::retry::{RetryPolicy, Sleeper, retry_with_backoff};
use crate::services::ActivityExecutor;

/// Terminal result of charging one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeOutcome {
    /// The item that was charged.
    pub item_id: ItemId,
    /// Last result after retries.
    pub result: Result<(), ActivityError>,
}

impl ChargeOutcome {
    /// Records the outcome on the bill: Charged on success, Failed otherwise.
    pub fn apply_to(&self, bill: &mut Bill) -> Result<(), BillError> {
        match &self.result {
            Ok(()) => bill.execute(|b| b.mark_item_charged(&self.item_id))?,
            Err(err) => bill.execute(|b| b.mark_item_failed(&self.item_id, err.to_string()))?,
        };
        Ok(())
    }
}

/// Counts of per-item outcomes after the barrier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChargeTally {
    pub charged: usize,
    pub failed: usize,
}

/// Fans out one charge per item and joins on all of them.
pub struct ChargeCoordinator<'a, A> {
    executor: &'a A,
    policy: &'a RetryPolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a, A> ChargeCoordinator<'a, A>
where
    A: ActivityExecutor,
{
    /// Creates a coordinator charging through `executor` with `policy`.
    pub fn new(executor: &'a A, policy: &'a RetryPolicy, sleeper: &'a dyn Sleeper) -> Self {
        Self {
            executor,
            policy,
            sleeper,
        }
    }

    /// Charges one item, retrying per policy.
    #[tracing::instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn charge_item(&self, bill_id: BillId, item: LineItem) -> ChargeOutcome {
        let executor = self.executor;
        let item_ref = &item;

        let result = retry_with_backoff(self.policy, self.sleeper, |attempt| {
            metrics::counter!("bill_item_charge_attempts_total").increment(1);
            tracing::debug!(attempt, "charging item");
            executor.charge(bill_id, item_ref)
        })
        .await;

        match &result {
            Ok(()) => tracing::info!(amount = %item.amount, "item charged"),
            Err(err) => {
                metrics::counter!("bill_item_charge_failures_total").increment(1);
                tracing::warn!(error = %err, "item charge failed after retries");
            }
        }

        ChargeOutcome {
            item_id: item.id,
            result,
        }
    }

    /// Charges every item concurrently and calls `on_outcome` as each finishes.
    ///
    /// Returns only after every charge reached a terminal outcome.
    #[tracing::instrument(skip(self, items, on_outcome), fields(items = items.len()))]
    pub async fn run<F>(
        &self,
        bill_id: BillId,
        items: Vec<LineItem>,
        mut on_outcome: F,
    ) -> ChargeTally
    where
        F: FnMut(ChargeOutcome),
    {
        let start = Instant::now();
        let mut in_flight: FuturesUnordered<_> = items
            .into_iter()
            .map(|item| self.charge_item(bill_id, item))
            .collect();

        let mut tally = ChargeTally::default();
        while let Some(outcome) = in_flight.next().await {
            if outcome.result.is_ok() {
                tally.charged += 1;
            } else {
                tally.failed += 1;
            }
            on_outcome(outcome);
        }

        metrics::histogram!("bill_charge_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tally
    }
}
