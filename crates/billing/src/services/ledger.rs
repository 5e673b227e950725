//! Account ledger trait and in-memory implementation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{BillId, Currency};
use domain::Money;
use tokio::sync::Mutex;

use crate::error::LedgerError;

/// Per-currency account balances shared by every bill.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Credits a settled bill's gross total. Repeat credits for one bill are ignored.
    async fn credit(
        &self,
        bill_id: BillId,
        amount: Money,
        currency: Currency,
    ) -> Result<(), LedgerError>;

    /// Withdraws from the balance of one currency.
    async fn withdraw(&self, currency: Currency, amount: Money) -> Result<(), LedgerError>;

    /// Returns the balance of every supported currency, zero-filled.
    async fn balances(&self) -> BTreeMap<Currency, Money>;
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Currency, Money>,
    credited: HashSet<BillId>,
    unavailable: bool,
}

/// In-memory ledger. Every read-modify-write happens under one lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every credit fail with [`LedgerError::Unavailable`].
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// Returns the balance of one currency.
    pub async fn balance(&self, currency: Currency) -> Money {
        self.state
            .lock()
            .await
            .balances
            .get(&currency)
            .copied()
            .unwrap_or_default()
    }

    /// Returns the number of bills credited.
    pub async fn credit_count(&self) -> usize {
        self.state.lock().await.credited.len()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn credit(
        &self,
        bill_id: BillId,
        amount: Money,
        currency: Currency,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: amount.minor_units(),
            });
        }

        let mut state = self.state.lock().await;
        if state.unavailable {
            return Err(LedgerError::Unavailable("ledger offline".to_string()));
        }
        if state.credited.contains(&bill_id) {
            tracing::debug!(%bill_id, "bill already credited, skipping");
            return Ok(());
        }

        let balance = state.balances.entry(currency).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount {
                amount: amount.minor_units(),
            })?;
        state.credited.insert(bill_id);

        tracing::info!(%bill_id, %currency, %amount, "account credited");
        Ok(())
    }

    async fn withdraw(&self, currency: Currency, amount: Money) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: amount.minor_units(),
            });
        }

        let mut state = self.state.lock().await;
        let balance = state.balances.entry(currency).or_default();
        if *balance < amount {
            return Err(LedgerError::InsufficientFunds {
                currency,
                balance: *balance,
                requested: amount,
            });
        }
        *balance = *balance - amount;

        tracing::info!(%currency, %amount, "account withdrawn");
        Ok(())
    }

    async fn balances(&self) -> BTreeMap<Currency, Money> {
        let state = self.state.lock().await;
        Currency::ALL
            .into_iter()
            .map(|currency| {
                let balance = state.balances.get(&currency).copied().unwrap_or_default();
                (currency, balance)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_credit_and_withdraw() {
        let ledger = InMemoryLedger::new();
        ledger
            .credit(BillId::new(), Money::from_minor(2000), Currency::Usd)
            .await
            .unwrap();

        ledger
            .withdraw(Currency::Usd, Money::from_minor(500))
            .await
            .unwrap();
        assert_eq!(ledger.balance(Currency::Usd).await, Money::from_minor(1500));
    }

    #[tokio::test]
    async fn test_credit_rejects_zero_and_negative() {
        let ledger = InMemoryLedger::new();
        let bill_id = BillId::new();

        assert_eq!(
            ledger.credit(bill_id, Money::zero(), Currency::Eur).await,
            Err(LedgerError::ZeroAmount)
        );
        assert_eq!(
            ledger
                .credit(bill_id, Money::from_minor(-1), Currency::Eur)
                .await,
            Err(LedgerError::InvalidAmount { amount: -1 })
        );
        assert_eq!(ledger.credit_count().await, 0);
    }

    #[tokio::test]
    async fn test_credit_is_deduplicated_per_bill() {
        let ledger = InMemoryLedger::new();
        let bill_id = BillId::new();

        for _ in 0..3 {
            ledger
                .credit(bill_id, Money::from_minor(100), Currency::Gel)
                .await
                .unwrap();
        }

        assert_eq!(ledger.balance(Currency::Gel).await, Money::from_minor(100));
        assert_eq!(ledger.credit_count().await, 1);
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds() {
        let ledger = InMemoryLedger::new();
        let result = ledger.withdraw(Currency::Usd, Money::from_minor(1)).await;

        assert_eq!(
            result,
            Err(LedgerError::InsufficientFunds {
                currency: Currency::Usd,
                balance: Money::zero(),
                requested: Money::from_minor(1),
            })
        );
    }

    #[tokio::test]
    async fn test_withdraw_rejects_non_positive() {
        let ledger = InMemoryLedger::new();
        assert!(matches!(
            ledger.withdraw(Currency::Usd, Money::zero()).await,
            Err(LedgerError::InvalidAmount { amount: 0 })
        ));
    }

    #[tokio::test]
    async fn test_balances_are_zero_filled() {
        let ledger = InMemoryLedger::new();
        ledger
            .credit(BillId::new(), Money::from_minor(7), Currency::Eur)
            .await
            .unwrap();

        let balances = ledger.balances().await;
        assert_eq!(balances.len(), 3);
        assert_eq!(balances[&Currency::Usd], Money::zero());
        assert_eq!(balances[&Currency::Eur], Money::from_minor(7));
        assert_eq!(balances[&Currency::Gel], Money::zero());
    }

    #[tokio::test]
    async fn test_unavailable_ledger() {
        let ledger = InMemoryLedger::new();
        ledger.set_unavailable(true).await;

        let result = ledger
            .credit(BillId::new(), Money::from_minor(10), Currency::Usd)
            .await;
        assert!(matches!(result, Err(LedgerError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_concurrent_credits_are_not_lost() {
        let ledger = InMemoryLedger::new();
        let mut tasks = Vec::new();
        for _ in 0..50 {
            let ledger = ledger.clone();
            tasks.push(tokio::spawn(async move {
                ledger
                    .credit(BillId::new(), Money::from_minor(2), Currency::Usd)
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(ledger.balance(Currency::Usd).await, Money::from_minor(100));
    }
}
