//! Persistence ports
//!
//! The tenancy ledger and the quotation store are reached only through async
//! traits declared in the domain crates. Those traits extend [`DomainPort`] and
//! report every failure as a [`PortError`], whether the implementation is the
//! PostgreSQL adapter or an in-memory mock.
//!
//! [`OperationMetadata`] travels with each call so log lines from the
//! orchestrator, the services and the adapters can be tied to one user action.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("{entity_type} {id} does not exist")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The store refused the row, e.g. a check constraint
    #[error("Rejected by store: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Write conflict: {message}")]
    Conflict {
        message: String,
    },

    #[error("Store unreachable: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Store did not answer within {duration_ms}ms ({operation})")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    #[error("Store failure: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// A rejection attributable to one column
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict { message: message.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn timeout(operation: impl Into<String>, waited: Duration) -> Self {
        PortError::Timeout {
            operation: operation.into(),
            duration_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an adapter error, keeping it as the source
    pub fn internal_from<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PortError::Internal {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// Connection and timeout failures; the write was not applied
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. } | PortError::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Entity kind of a `NotFound`, e.g. `Tenancy`
    pub fn missing_entity(&self) -> Option<&str> {
        match self {
            PortError::NotFound { entity_type, .. } => Some(entity_type),
            _ => None,
        }
    }
}

/// Marker for persistence ports; they are shared behind `Arc<dyn ...>`
pub trait DomainPort: Send + Sync + 'static {}

/// Who asked for an operation and under which correlation id
#[derive(Debug, Clone, Default)]
pub struct OperationMetadata {
    pub correlation_id: Option<String>,
    pub initiated_by: Option<String>,
    /// Extra log context such as the screen the action came from
    pub context: BTreeMap<String, String>,
}

impl OperationMetadata {
    pub fn with_correlation_id(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(correlation_id.into()),
            ..Default::default()
        }
    }

    /// Metadata with a fresh time-ordered correlation id
    pub fn generated() -> Self {
        Self::with_correlation_id(uuid::Uuid::now_v7().to_string())
    }

    pub fn initiated_by(mut self, user: impl Into<String>) -> Self {
        self.initiated_by = Some(user.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Correlation id for log fields, `-` when absent
    pub fn correlation(&self) -> &str {
        self.correlation_id.as_deref().unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_entity() {
        let error = PortError::not_found("Tenancy", "TEN-123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert_eq!(error.missing_entity(), Some("Tenancy"));
        assert_eq!(error.to_string(), "Tenancy TEN-123 does not exist");
    }

    #[test]
    fn test_transient_kinds() {
        assert!(PortError::timeout("append_entry", Duration::from_secs(5)).is_transient());
        assert!(PortError::connection("refused").is_transient());
        assert!(!PortError::validation("amount must be positive").is_transient());
        assert!(!PortError::conflict("quotation number taken").is_transient());
        assert_eq!(PortError::internal("boom").missing_entity(), None);
    }

    #[test]
    fn test_internal_from_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let error = PortError::internal_from(io);
        assert!(std::error::Error::source(&error).is_some());
        assert!(error.to_string().contains("disk gone"));
    }

    #[test]
    fn test_metadata_builders() {
        let metadata = OperationMetadata::with_correlation_id("req-123")
            .initiated_by("office-admin")
            .with_context("screen", "payment-calendar");

        assert_eq!(metadata.correlation(), "req-123");
        assert_eq!(metadata.initiated_by.as_deref(), Some("office-admin"));
        assert_eq!(metadata.context.get("screen").map(String::as_str), Some("payment-calendar"));
        assert_eq!(OperationMetadata::default().correlation(), "-");
        assert_ne!(OperationMetadata::generated().correlation(), "-");
    }
}
