//! Quotation Domain - line items and GST totals
//!
//! This crate covers quotations from first edit to stored snapshot:
//! - Line items whose amount is always `quantity * rate`
//! - The tax engine splitting each line's tax into SGST and CGST
//! - `QuotationDraft`, the in-memory editor
//! - `QuotationService`, which validates and stores drafts

pub mod line_item;
pub mod tax;
pub mod quotation;
pub mod editor;
pub mod ports;
pub mod service;
pub mod error;

pub use line_item::{QuotationLineItem, DEFAULT_TAX_RATE_PERCENT, LINE_DECIMAL_PLACES, MAX_LINE_VALUE};
pub use tax::{LineTax, QuotationTotals, TaxEngine, TotalsSnapshot};
pub use quotation::{QuotationDocument, QuotationStatus};
pub use editor::QuotationDraft;
pub use ports::{
    format_quotation_number, QuotationNumberSequence, QuotationPort, QuotationQuery,
    QUOTATION_NUMBER_PREFIX,
};
pub use service::QuotationService;
pub use error::QuotationError;
