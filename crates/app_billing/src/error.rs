//! Application errors

use thiserror::Error;

use core_kernel::{CoreError, PortError};
use domain_documents::RenderError;
use domain_quotation::QuotationError;
use domain_tenancy::TenancyError;
use infra_db::DatabaseError;

use crate::notification::{Notice, Notifier};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Tenancy(#[from] TenancyError),

    #[error(transparent)]
    Quotation(#[from] QuotationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Localization error: {0}")]
    Localization(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        AppError::InvalidConfig(message.into())
    }

    /// The notice shown to the user for this error
    pub fn notice(&self) -> Notice {
        match self {
            AppError::Tenancy(TenancyError::Validation(reason))
            | AppError::Quotation(QuotationError::Validation(reason))
            | AppError::Validation(reason) => Notice::new("validation-error").with_arg("reason", reason),
            AppError::Tenancy(TenancyError::AlreadyLogged { month, .. }) => {
                Notice::new("already-logged").with_arg("month", month)
            }
            AppError::Tenancy(TenancyError::Persistence(e)) | AppError::Quotation(QuotationError::Persistence(e)) => {
                port_notice(e)
            }
            AppError::Quotation(QuotationError::InvalidTransition { from, to }) => Notice::new("invalid-transition")
                .with_arg("from", from)
                .with_arg("to", to),
            AppError::Quotation(QuotationError::UnknownLine(_)) => Notice::new("unknown-line"),
            AppError::Render(RenderError::TotalsMismatch { document, .. }) => {
                Notice::new("totals-mismatch").with_arg("document", document)
            }
            AppError::Render(e) => Notice::new("export-failed").with_arg("reason", e),
            AppError::Database(e) if e.is_connection_error() => Notice::new("store-unavailable"),
            AppError::Database(_) => Notice::new("save-failed"),
            AppError::Config(e) => Notice::new("config-error").with_arg("reason", e),
            AppError::InvalidConfig(reason) | AppError::Localization(reason) => {
                Notice::new("config-error").with_arg("reason", reason)
            }
        }
    }

    /// Short localized message for this error
    pub fn notification(&self, notifier: &Notifier) -> String {
        notifier.render(&self.notice())
    }
}

impl From<CoreError> for AppError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Configuration(message) => AppError::InvalidConfig(message),
            other => AppError::Validation(other.to_string()),
        }
    }
}

fn port_notice(error: &PortError) -> Notice {
    match error {
        PortError::NotFound { entity_type, .. } => {
            Notice::new("not-found").with_arg("entity", entity_type.to_lowercase())
        }
        PortError::Validation { message, .. } => Notice::new("validation-error").with_arg("reason", message),
        PortError::Conflict { .. } => Notice::new("write-conflict"),
        e if e.is_transient() => Notice::new("store-unavailable"),
        _ => Notice::new("save-failed"),
    }
}
