//! In-memory quotation draft
//!
//! The draft owns the line list while a quotation is being edited. Every
//! mutation re-runs the full tax computation, and the list never drops below
//! one line.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{ClientId, LineItemId};

use crate::error::QuotationError;
use crate::line_item::QuotationLineItem;
use crate::quotation::QuotationDocument;
use crate::tax::{QuotationTotals, TaxEngine};

#[derive(Debug, Clone)]
pub struct QuotationDraft {
    document: QuotationDocument,
    lines: Vec<QuotationLineItem>,
    totals: QuotationTotals,
    default_tax_rate: Decimal,
}

impl QuotationDraft {
    /// Starts a draft with a single blank line
    pub fn new(document: QuotationDocument, default_tax_rate: Decimal) -> Result<Self, QuotationError> {
        let blank = QuotationLineItem::blank(document.id, default_tax_rate)?;
        Self::from_saved(document, vec![blank], default_tax_rate)
    }

    /// Resumes editing a stored quotation
    pub fn from_saved(
        document: QuotationDocument,
        mut lines: Vec<QuotationLineItem>,
        default_tax_rate: Decimal,
    ) -> Result<Self, QuotationError> {
        if lines.is_empty() {
            lines.push(QuotationLineItem::blank(document.id, default_tax_rate)?);
        }
        lines.sort_by_key(|line| line.display_order);
        let totals = QuotationTotals::empty(document.currency);
        let mut draft = Self {
            document,
            lines,
            totals,
            default_tax_rate,
        };
        draft.recompute();
        Ok(draft)
    }

    pub fn document(&self) -> &QuotationDocument {
        &self.document
    }

    pub fn lines(&self) -> &[QuotationLineItem] {
        &self.lines
    }

    pub fn totals(&self) -> &QuotationTotals {
        &self.totals
    }

    pub fn line(&self, id: LineItemId) -> Option<&QuotationLineItem> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub fn select_client(&mut self, client_id: ClientId) {
        self.document.client_id = Some(client_id);
    }

    pub fn set_quotation_date(&mut self, date: NaiveDate) {
        self.document.quotation_date = date;
    }

    pub fn set_valid_until(&mut self, date: Option<NaiveDate>) {
        self.document.valid_until = date;
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.document.notes = notes;
    }

    /// Appends a blank line using the configured tax rate
    pub fn add_line(&mut self) -> Result<LineItemId, QuotationError> {
        let line = QuotationLineItem::blank(self.document.id, self.default_tax_rate)?;
        let id = line.id;
        self.lines.push(line);
        self.recompute();
        Ok(id)
    }

    /// Removes a line; returns false and keeps the list when it is the last one
    pub fn remove_line(&mut self, id: LineItemId) -> bool {
        if self.lines.len() <= 1 {
            return false;
        }
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        let removed = self.lines.len() < before;
        if removed {
            self.recompute();
        }
        removed
    }

    pub fn set_description(&mut self, id: LineItemId, description: impl Into<String>) -> Result<(), QuotationError> {
        self.line_mut(id)?.set_description(description);
        self.recompute();
        Ok(())
    }

    pub fn set_quantity(&mut self, id: LineItemId, quantity: Decimal) -> Result<(), QuotationError> {
        self.line_mut(id)?.set_quantity(quantity)?;
        self.recompute();
        Ok(())
    }

    pub fn set_rate(&mut self, id: LineItemId, rate: Decimal) -> Result<(), QuotationError> {
        self.line_mut(id)?.set_rate(rate)?;
        self.recompute();
        Ok(())
    }

    pub fn set_tax_rate(&mut self, id: LineItemId, tax_rate_percent: Decimal) -> Result<(), QuotationError> {
        self.line_mut(id)?.set_tax_rate(tax_rate_percent)?;
        self.recompute();
        Ok(())
    }

    /// Checks the two save preconditions
    pub fn validate_for_save(&self) -> Result<(), QuotationError> {
        if self.document.client_id.is_none() {
            return Err(QuotationError::validation("Please select a client"));
        }
        if !self.lines.iter().any(QuotationLineItem::has_description) {
            return Err(QuotationError::validation(
                "At least one line item needs a description",
            ));
        }
        Ok(())
    }

    /// Renumbers lines contiguously and recomputes all totals
    pub fn recompute(&mut self) {
        for (index, line) in self.lines.iter_mut().enumerate() {
            line.display_order = index as u32;
        }
        self.totals = TaxEngine::compute(&self.lines, self.document.currency);
    }

    /// Writes the current totals onto the document snapshot
    pub fn snapshot_totals(&mut self) {
        self.recompute();
        self.document.apply_totals(&self.totals);
    }

    /// Replaces the document after a save, keeping the line list
    pub(crate) fn replace_document(&mut self, document: QuotationDocument) {
        self.document = document;
    }

    pub fn into_parts(self) -> (QuotationDocument, Vec<QuotationLineItem>) {
        (self.document, self.lines)
    }

    fn line_mut(&mut self, id: LineItemId) -> Result<&mut QuotationLineItem, QuotationError> {
        self.lines
            .iter_mut()
            .find(|line| line.id == id)
            .ok_or(QuotationError::UnknownLine(id))
    }
}
