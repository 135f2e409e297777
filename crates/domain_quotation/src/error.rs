//! Quotation domain errors

use thiserror::Error;

use core_kernel::{LineItemId, PortError};

use crate::quotation::QuotationStatus;

#[derive(Debug, Error)]
pub enum QuotationError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot move a quotation from {from} to {to}")]
    InvalidTransition {
        from: QuotationStatus,
        to: QuotationStatus,
    },

    #[error("Line item {0} is not part of this quotation")]
    UnknownLine(LineItemId),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PortError),
}

impl QuotationError {
    pub fn validation(message: impl Into<String>) -> Self {
        QuotationError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, QuotationError::Validation(_))
    }
}
