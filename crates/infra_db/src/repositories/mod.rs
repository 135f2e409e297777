//! PostgreSQL implementations of the domain ports
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` rows;
//! each row type converts into its domain value with `TryFrom`, reporting
//! unreadable stored values as `DatabaseError::CorruptRow`.

pub mod tenancy;
pub mod quotation;

pub use tenancy::{PaymentEntryRow, PostgresTenancyLedger, TenancyRow};
pub use quotation::{LineItemRow, PostgresQuotationStore, QuotationRow};
