//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for the tenancy ledger and the quotation store, built
//! on SQLx. Multi-step writes run inside a single transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresTenancyLedger};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/billing")).await?;
//! run_migrations(&pool).await?;
//! let ledger = PostgresTenancyLedger::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;

pub use pool::{create_pool, ping, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use repositories::{PostgresQuotationStore, PostgresTenancyLedger};
