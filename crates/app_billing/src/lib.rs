//! Billing application layer
//!
//! Wires the tenancy, quotation and document crates together behind
//! [`ReconciliationOrchestrator`], and carries the application concerns the
//! domain crates leave out:
//! - `BillingConfig`, loaded from `BILLING_*` environment variables
//! - Tracing subscriber initialisation
//! - `AppError` and its localized user notifications

pub mod config;
pub mod telemetry;
pub mod notification;
pub mod orchestrator;
pub mod error;

pub use config::{BillingConfig, BillingSettings, MAX_LOOK_AHEAD_MONTHS};
pub use telemetry::{env_filter, init_tracing};
pub use notification::{Notice, Notifier};
pub use orchestrator::{ReconciliationOrchestrator, SavedExport};
pub use error::AppError;
