//! HTTP API server with observability for the bill lifecycle orchestrator.
//!
//! Provides REST endpoints for opening, filling, charging and canceling
//! bills and for reading and withdrawing ledger balances, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use billing::{ActivityExecutor, BillRegistry, InMemoryActivityExecutor, InMemoryLedger, Ledger};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<A, L> {
    /// Running bill workflows.
    pub registry: BillRegistry<A, L>,
    /// Billing period applied when a bill is opened without an end.
    pub default_period: chrono::Duration,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<A, L>(state: Arc<AppState<A, L>>, metrics_handle: PrometheusHandle) -> Router
where
    A: ActivityExecutor + Clone + 'static,
    L: Ledger + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/bills", post(routes::bills::open::<A, L>))
        .route("/bills/{id}", get(routes::bills::get::<A, L>))
        .route("/bills/{id}/items", post(routes::bills::add_item::<A, L>))
        .route("/bills/{id}/charge", post(routes::bills::charge::<A, L>))
        .route("/bills/{id}/cancel", post(routes::bills::cancel::<A, L>))
        .route("/balances", get(routes::balances::list::<A, L>))
        .route(
            "/balances/{currency}/withdraw",
            post(routes::balances::withdraw::<A, L>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state with in-memory collaborators.
pub fn create_default_state(
    config: &Config,
) -> Arc<AppState<InMemoryActivityExecutor, InMemoryLedger>> {
    let registry = BillRegistry::new(
        InMemoryActivityExecutor::new(),
        InMemoryLedger::new(),
        config.workflow_settings(),
    );

    Arc::new(AppState {
        registry,
        default_period: config.default_period(),
    })
}
