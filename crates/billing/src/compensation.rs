//! Refunds of charged items after a partial charge failure.

use common::BillId;
use domain::{ItemId, LineItem};
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::services::ActivityExecutor;

/// Refunds every given item concurrently and joins on all of them.
pub struct CompensationCoordinator<'a, A> {
    executor: &'a A,
}

impl<'a, A> CompensationCoordinator<'a, A>
where
    A: ActivityExecutor,
{
    /// Creates a coordinator refunding through `executor`.
    pub fn new(executor: &'a A) -> Self {
        Self { executor }
    }

    /// Refunds `items` and calls `on_refunded` as each refund completes.
    ///
    /// Refunds never fail at this layer. Returns the number of refunded items
    /// once every refund finished.
    #[tracing::instrument(skip(self, items, on_refunded), fields(items = items.len()))]
    pub async fn run<F>(
        &self,
        bill_id: BillId,
        items: Vec<LineItem>,
        mut on_refunded: F,
    ) -> usize
    where
        F: FnMut(ItemId),
    {
        let executor = self.executor;
        let mut in_flight: FuturesUnordered<_> = items
            .into_iter()
            .map(|item| async move {
                executor.refund(bill_id, &item).await;
                tracing::info!(item_id = %item.id, amount = %item.amount, "item refunded");
                item.id
            })
            .collect();

        let mut refunded = 0;
        while let Some(item_id) = in_flight.next().await {
            refunded += 1;
            on_refunded(item_id);
        }

        tracing::info!(refunded, "compensation barrier reached");
        refunded
    }
}
