//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use billing::{BillingError, LedgerError};
use domain::BillError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
    /// Bill workflow error.
    #[error(transparent)]
    Billing(#[from] BillingError),
    /// Ledger error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ApiError {
    /// Returns the HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Billing(err) => billing_status(err),
            ApiError::Ledger(err) => ledger_status(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn billing_status(err: &BillingError) -> StatusCode {
    match err {
        BillingError::Rejected(rejected) => bill_status(rejected),
        BillingError::BillNotFound(_) => StatusCode::NOT_FOUND,
        BillingError::ChargeFailed { .. } | BillingError::ChargeCompensated { .. } => {
            StatusCode::CONFLICT
        }
        BillingError::InvalidState { .. } | BillingError::LoopClosed => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn bill_status(err: &BillError) -> StatusCode {
    match err {
        BillError::NotOpen { .. }
        | BillError::DuplicateItem { .. }
        | BillError::NoPendingItems
        | BillError::CannotCancel { .. }
        | BillError::InvalidItemTransition { .. }
        | BillError::InvalidTransition { .. } => StatusCode::CONFLICT,
        BillError::InvalidAmount { .. }
        | BillError::EmptyItemId
        | BillError::EmptyItemName
        | BillError::TotalOverflow => StatusCode::BAD_REQUEST,
        BillError::ItemNotFound { .. } => StatusCode::NOT_FOUND,
        BillError::InconsistentItemStatus { .. } | BillError::MissingOpenEvent => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::ZeroAmount | LedgerError::InvalidAmount { .. } => StatusCode::BAD_REQUEST,
        LedgerError::InsufficientFunds { .. } => StatusCode::CONFLICT,
        LedgerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{BillId, Currency};
    use domain::{BillStatus, ItemId, ItemStatus, Money};

    #[test]
    fn test_rejections_map_to_conflict_or_bad_request() {
        let duplicate = ApiError::from(BillingError::Rejected(BillError::DuplicateItem {
            item_id: ItemId::new("dup"),
        }));
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let not_open = ApiError::from(BillingError::Rejected(BillError::NotOpen {
            status: BillStatus::Charging,
        }));
        assert_eq!(not_open.status(), StatusCode::CONFLICT);

        let blank = ApiError::from(BillingError::Rejected(BillError::EmptyItemName));
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unknown_bill_is_not_found() {
        let err = ApiError::from(BillingError::BillNotFound(BillId::new()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_ledger_errors() {
        let insufficient = ApiError::from(LedgerError::InsufficientFunds {
            currency: Currency::Usd,
            balance: Money::zero(),
            requested: Money::from_minor(10),
        });
        assert_eq!(insufficient.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(LedgerError::InvalidAmount { amount: -1 }).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_fatal_errors_are_internal() {
        let err = ApiError::from(BillingError::InvalidState {
            status: BillStatus::Open,
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let inconsistent = ApiError::from(BillingError::Rejected(
            BillError::InconsistentItemStatus {
                item_id: ItemId::new("a"),
                item_status: ItemStatus::Refunded,
                bill_status: BillStatus::Settled,
            },
        ));
        assert_eq!(inconsistent.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
