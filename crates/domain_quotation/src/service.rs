//! Quotation save workflow

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};

use core_kernel::{Currency, OperationMetadata, QuotationId};

use crate::editor::QuotationDraft;
use crate::error::QuotationError;
use crate::line_item::QuotationLineItem;
use crate::ports::{QuotationNumberSequence, QuotationPort};
use crate::quotation::{QuotationDocument, QuotationStatus};

pub struct QuotationService {
    port: Arc<dyn QuotationPort>,
    numbers: Arc<dyn QuotationNumberSequence>,
    default_tax_rate: Decimal,
}

impl QuotationService {
    pub fn new(
        port: Arc<dyn QuotationPort>,
        numbers: Arc<dyn QuotationNumberSequence>,
        default_tax_rate: Decimal,
    ) -> Self {
        Self {
            port,
            numbers,
            default_tax_rate,
        }
    }

    pub fn default_tax_rate(&self) -> Decimal {
        self.default_tax_rate
    }

    pub fn new_draft(&self, currency: Currency, quotation_date: NaiveDate) -> Result<QuotationDraft, QuotationError> {
        QuotationDraft::new(QuotationDocument::new(currency, quotation_date), self.default_tax_rate)
    }

    /// Validates, snapshots totals and stores the draft
    ///
    /// A number is taken from the sequence on the first save. The document
    /// row and its full line list are written in one port call, and every
    /// in-memory line is stored, including lines without a description.
    pub async fn save(
        &self,
        draft: &mut QuotationDraft,
        metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDocument, QuotationError> {
        if let Err(e) = draft.validate_for_save() {
            warn!(quotation_id = %draft.document().id, error = %e, "Rejected quotation save");
            return Err(e);
        }
        draft.snapshot_totals();

        let mut document = draft.document().clone();
        if document.quotation_number.is_none() {
            document.quotation_number = Some(self.numbers.next_number(metadata.clone()).await?);
        }

        match self.port.save_quotation(&document, draft.lines(), metadata).await {
            Ok(saved) => {
                info!(
                    quotation_id = %saved.id,
                    quotation_number = saved.display_number(),
                    lines = draft.lines().len(),
                    total = %saved.totals.total,
                    "Quotation saved"
                );
                draft.replace_document(saved.clone());
                Ok(saved)
            }
            Err(e) => {
                error!(quotation_id = %document.id, error = %e, "Failed to save quotation");
                Err(e.into())
            }
        }
    }

    /// Moves a stored quotation to `status` if the lifecycle allows it
    pub async fn transition(
        &self,
        id: QuotationId,
        status: QuotationStatus,
        metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDocument, QuotationError> {
        let mut document = self.port.get_quotation(id, metadata.clone()).await?;
        let from = document.status;
        document.transition_to(status).map_err(|e| {
            warn!(quotation_id = %id, from = %from, to = %status, "Rejected status change");
            e
        })?;

        let updated = self.port.update_status(id, status, metadata).await?;
        info!(quotation_id = %id, from = %from, to = %status, "Quotation status changed");
        Ok(updated)
    }

    /// Loads a stored quotation back into an editable draft
    pub async fn load_draft(
        &self,
        id: QuotationId,
        metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDraft, QuotationError> {
        let (document, items) = self.load(id, metadata).await?;
        QuotationDraft::from_saved(document, items, self.default_tax_rate)
    }

    pub async fn load(
        &self,
        id: QuotationId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(QuotationDocument, Vec<QuotationLineItem>), QuotationError> {
        let document = self.port.get_quotation(id, metadata.clone()).await?;
        let items = self.port.list_line_items(id, metadata).await?;
        Ok((document, items))
    }
}
