//! Bill lifecycle orchestration.
//!
//! Each bill is driven by a single [`BillWorkflow`] task that owns the
//! aggregate. While the bill is open the workflow multiplexes three signal
//! channels and a deadline timer. Once charging starts it:
//! 1. Charges every pending item concurrently, retrying with backoff
//! 2. Waits for every charge to finish
//! 3. Settles, fails, or refunds the charged items when only some failed
//!
//! Callers interact through a [`BillHandle`]; readers take [`BillQuery`]
//! snapshots without blocking the workflow.

pub mod charge;
pub mod compensation;
pub mod error;
pub mod handle;
pub mod query;
pub mod registry;
pub mod resolution;
pub mod retry;
pub mod services;
pub mod settings;
pub mod workflow;

pub use charge::{ChargeCoordinator, ChargeOutcome, ChargeTally};
pub use compensation::CompensationCoordinator;
pub use error::{ActivityError, BillingError, LedgerError};
pub use handle::BillHandle;
pub use query::{BillQuery, QueryPublisher};
pub use registry::BillRegistry;
pub use resolution::Resolution;
pub use retry::{RecordingSleeper, RetryPolicy, RetryPolicyBuilder, Sleeper, TokioSleeper};
pub use services::{ActivityExecutor, InMemoryActivityExecutor, InMemoryLedger, Ledger};
pub use settings::WorkflowSettings;
pub use workflow::BillWorkflow;
