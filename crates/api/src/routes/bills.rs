//! Bill lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use billing::{ActivityExecutor, BillHandle, Ledger};
use chrono::{DateTime, Utc};
use common::{BillId, Currency};
use domain::{BillSnapshot, LineItem, Money};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct OpenBillRequest {
    pub currency: String,
    /// RFC 3339 instant; defaults to now plus the configured period.
    pub period_end: Option<String>,
}

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub id: String,
    pub name: String,
    pub amount: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct BillOpenedResponse {
    pub bill_id: String,
}

#[derive(Serialize)]
pub struct BillResponse {
    pub id: String,
    pub status: String,
    pub currency: String,
    pub total: i64,
    pub period_end: String,
    pub items: Vec<LineItemResponse>,
}

#[derive(Serialize)]
pub struct LineItemResponse {
    pub id: String,
    pub name: String,
    pub amount: i64,
    pub status: String,
}

impl From<BillSnapshot> for BillResponse {
    fn from(snapshot: BillSnapshot) -> Self {
        Self {
            id: snapshot.id.to_string(),
            status: snapshot.status.to_string(),
            currency: snapshot.currency.to_string(),
            total: snapshot.total.minor_units(),
            period_end: snapshot.deadline.to_rfc3339(),
            items: snapshot
                .items
                .into_iter()
                .map(|item| LineItemResponse {
                    id: item.id.to_string(),
                    name: item.name,
                    amount: item.amount.minor_units(),
                    status: item.status.to_string(),
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /bills: open a bill and start its workflow.
#[tracing::instrument(skip(state, req))]
pub async fn open<A, L>(
    State(state): State<Arc<AppState<A, L>>>,
    Json(req): Json<OpenBillRequest>,
) -> Result<(StatusCode, Json<BillOpenedResponse>), ApiError>
where
    A: ActivityExecutor + Clone + 'static,
    L: Ledger + Clone + 'static,
{
    let currency =
        Currency::parse(&req.currency).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let now = Utc::now();
    let deadline = match req.period_end.as_deref() {
        Some(raw) => parse_period_end(raw, now)?,
        None => now + state.default_period,
    };

    let handle = state.registry.open_bill(currency, deadline).await;
    tracing::info!(bill_id = %handle.id(), %currency, %deadline, "bill opened");

    let response = BillOpenedResponse {
        bill_id: handle.id().to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /bills/{id}: current snapshot of a bill.
#[tracing::instrument(skip(state))]
pub async fn get<A, L>(
    State(state): State<Arc<AppState<A, L>>>,
    Path(id): Path<String>,
) -> Result<Json<BillResponse>, ApiError>
where
    A: ActivityExecutor + Clone + 'static,
    L: Ledger + Clone + 'static,
{
    let handle = find_bill(&state, &id).await?;
    Ok(Json(handle.snapshot().into()))
}

/// POST /bills/{id}/items: add a line item to an open bill.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<A, L>(
    State(state): State<Arc<AppState<A, L>>>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<StatusCode, ApiError>
where
    A: ActivityExecutor + Clone + 'static,
    L: Ledger + Clone + 'static,
{
    if req.id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "item id is required and must be non-empty".to_string(),
        ));
    }
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "item name is required and must be non-empty".to_string(),
        ));
    }
    if req.amount <= 0 {
        return Err(ApiError::BadRequest(format!(
            "invalid amount: {} (must be greater than 0)",
            req.amount
        )));
    }

    let handle = find_bill(&state, &id).await?;
    handle
        .add_item(LineItem::new(req.id, req.name, Money::from_minor(req.amount)))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /bills/{id}/charge: stop accepting items and charge the pending ones.
#[tracing::instrument(skip(state))]
pub async fn charge<A, L>(
    State(state): State<Arc<AppState<A, L>>>,
    Path(id): Path<String>,
) -> Result<Json<BillResponse>, ApiError>
where
    A: ActivityExecutor + Clone + 'static,
    L: Ledger + Clone + 'static,
{
    let handle = find_bill(&state, &id).await?;
    handle.charge().await?;
    Ok(Json(handle.snapshot().into()))
}

/// POST /bills/{id}/cancel: cancel an open bill.
#[tracing::instrument(skip(state))]
pub async fn cancel<A, L>(
    State(state): State<Arc<AppState<A, L>>>,
    Path(id): Path<String>,
) -> Result<Json<BillResponse>, ApiError>
where
    A: ActivityExecutor + Clone + 'static,
    L: Ledger + Clone + 'static,
{
    let handle = find_bill(&state, &id).await?;
    handle.cancel().await?;
    Ok(Json(handle.snapshot().into()))
}

async fn find_bill<A, L>(state: &AppState<A, L>, id: &str) -> Result<BillHandle, ApiError>
where
    A: ActivityExecutor + Clone + 'static,
    L: Ledger + Clone + 'static,
{
    let bill_id = BillId::parse(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(state.registry.get(bill_id).await?)
}

fn parse_period_end(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ApiError> {
    let deadline = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid period_end: {e}")))?
        .with_timezone(&Utc);
    if deadline <= now {
        return Err(ApiError::BadRequest(
            "period_end must be in the future".to_string(),
        ));
    }
    Ok(deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_period_end_in_the_future() {
        let now = Utc::now();
        let raw = (now + Duration::days(2)).to_rfc3339();
        let parsed = parse_period_end(&raw, now).unwrap();
        assert!(parsed > now);
    }

    #[test]
    fn test_period_end_in_the_past_is_rejected() {
        let now = Utc::now();
        let raw = (now - Duration::minutes(1)).to_rfc3339();
        assert!(matches!(
            parse_period_end(&raw, now),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_period_end_must_be_rfc3339() {
        assert!(matches!(
            parse_period_end("next tuesday", Utc::now()),
            Err(ApiError::BadRequest(_))
        ));
    }
}
