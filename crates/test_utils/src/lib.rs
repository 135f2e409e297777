//! Test Utilities Crate
//!
//! Shared test infrastructure for the billing core test suite.
//!
//! # Modules
//!
//! - `fixtures`: The standard lease, ledger and GST quotation scenarios
//! - `builders`: Builders for tenancies, ledger entries and quotations
//! - `database`: PostgreSQL container management
//! - `assertions`: Assertion helpers for money, totals and layouts
//! - `generators`: Proptest strategies for valid domain values

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
