//! Tenancy domain errors

use thiserror::Error;

use core_kernel::{BillingMonth, PortError, TenancyId};

/// Errors that can occur in the tenancy domain
#[derive(Debug, Error)]
pub enum TenancyError {
    /// Bad or missing input, raised before anything is written
    #[error("Validation error: {0}")]
    Validation(String),

    /// The month already has a ledger entry
    #[error("A payment is already logged for {tenancy_id} in {month}")]
    AlreadyLogged {
        tenancy_id: TenancyId,
        month: BillingMonth,
    },

    /// The store rejected a read or write
    #[error("Persistence error: {0}")]
    Persistence(#[from] PortError),
}

impl TenancyError {
    pub fn validation(message: impl Into<String>) -> Self {
        TenancyError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, TenancyError::Validation(_))
    }

    pub fn is_already_logged(&self) -> bool {
        matches!(self, TenancyError::AlreadyLogged { .. })
    }
}
