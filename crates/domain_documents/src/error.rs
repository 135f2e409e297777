//! Rendering and export errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Recomputed totals disagree with the stored snapshot
    #[error("Totals mismatch for {document}: stored {stored}, recomputed {recomputed}")]
    TotalsMismatch {
        document: String,
        stored: String,
        recomputed: String,
    },

    #[error("Invalid page budget: {0}")]
    InvalidBudget(String),

    #[error("Unknown tax layout '{0}', expected 'itemized' or 'consolidated'")]
    UnknownTaxLayout(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
