//! Documents - paginated layouts for quotations and rent statements
//!
//! Renderers produce a `DocumentLayout`; export sinks turn it into a file.
//! Quotation figures always come from the tax engine, never from a separate
//! summation.

pub mod layout;
pub mod details;
pub mod quotation;
pub mod statement;
pub mod export;
pub mod error;

pub use layout::{
    Align, Block, Column, DocumentKind, DocumentLayout, IssuerBlock, Page, PageBudget, PartyBlock,
    TableBlock, TextBlock, TitleBlock, TotalsBlock,
};
pub use details::{file_stem, ClientDetails, IssuerDetails};
pub use quotation::{QuotationRenderInput, QuotationRenderer, TaxLayout, DATE_FORMAT};
pub use statement::{LeaseStatementInput, LeaseStatementRenderer};
pub use export::{DocumentSink, ExportedDocument, JsonSink, TextSink, PAGE_SEPARATOR};
pub use error::RenderError;
