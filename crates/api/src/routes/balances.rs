//! Ledger balance endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use billing::{ActivityExecutor, Ledger};
use common::Currency;
use domain::Money;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct WithdrawRequest {
    pub amount: i64,
}

#[derive(Serialize)]
pub struct BalancesResponse {
    /// Minor units per currency code, zero-filled for every supported currency.
    pub balances: BTreeMap<String, i64>,
}

/// GET /balances: balance of every supported currency.
#[tracing::instrument(skip(state))]
pub async fn list<A, L>(State(state): State<Arc<AppState<A, L>>>) -> Json<BalancesResponse>
where
    A: ActivityExecutor + Clone + 'static,
    L: Ledger + Clone + 'static,
{
    let balances = state
        .registry
        .ledger()
        .balances()
        .await
        .into_iter()
        .map(|(currency, amount)| (currency.code().to_string(), amount.minor_units()))
        .collect();

    Json(BalancesResponse { balances })
}

/// POST /balances/{currency}/withdraw: take money out of one currency's balance.
#[tracing::instrument(skip(state, req))]
pub async fn withdraw<A, L>(
    State(state): State<Arc<AppState<A, L>>>,
    Path(currency): Path<String>,
    Json(req): Json<WithdrawRequest>,
) -> Result<StatusCode, ApiError>
where
    A: ActivityExecutor + Clone + 'static,
    L: Ledger + Clone + 'static,
{
    let currency = Currency::parse(&currency).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .registry
        .ledger()
        .withdraw(currency, Money::from_minor(req.amount))
        .await?;

    metrics::counter!("ledger_withdrawals_total").increment(1);
    tracing::info!(%currency, amount = req.amount, "balance withdrawn");
    Ok(StatusCode::NO_CONTENT)
}
