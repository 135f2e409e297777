//! Reconciliation orchestrator
//!
//! The single entry point for the billing screens. It owns the domain
//! services, decides what "today" is from the business clock, applies the
//! configured settings and hands rendered layouts to the export sink. Every
//! failure comes back as an [`AppError`]; nothing is retried.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info};

use core_kernel::{BillingMonth, BusinessClock, OperationMetadata, PaymentEntryId, QuotationId, TenancyId};
use domain_documents::{
    ClientDetails, DocumentLayout, DocumentSink, ExportedDocument, LeaseStatementInput, LeaseStatementRenderer,
    QuotationRenderInput, QuotationRenderer,
};
use domain_quotation::{
    QuotationDocument, QuotationDraft, QuotationLineItem, QuotationNumberSequence, QuotationPort, QuotationService,
    QuotationStatus,
};
use domain_tenancy::{
    PaymentCalendar, PaymentLedgerEntry, PaymentOutlook, RecordPaymentRequest, Tenancy, TenancyLedgerPort,
    TenancyLedgerService,
};

use crate::config::BillingSettings;
use crate::error::AppError;

/// A quotation that was stored and then exported
#[derive(Debug, Clone)]
pub struct SavedExport {
    pub document: QuotationDocument,
    pub export: ExportedDocument,
}

pub struct ReconciliationOrchestrator {
    ledger: TenancyLedgerService,
    quotations: QuotationService,
    clock: Arc<dyn BusinessClock>,
    settings: BillingSettings,
    sink: Arc<dyn DocumentSink>,
}

impl ReconciliationOrchestrator {
    pub fn new(
        tenancy_port: Arc<dyn TenancyLedgerPort>,
        quotation_port: Arc<dyn QuotationPort>,
        numbers: Arc<dyn QuotationNumberSequence>,
        clock: Arc<dyn BusinessClock>,
        settings: BillingSettings,
        sink: Arc<dyn DocumentSink>,
    ) -> Self {
        Self {
            ledger: TenancyLedgerService::new(tenancy_port),
            quotations: QuotationService::new(quotation_port, numbers, settings.default_tax_rate),
            clock,
            settings,
            sink,
        }
    }

    pub fn settings(&self) -> &BillingSettings {
        &self.settings
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Records a payment and refreshes the tenancy's cached status
    pub async fn record_payment(
        &self,
        request: RecordPaymentRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<(PaymentLedgerEntry, Tenancy), AppError> {
        Ok(self.ledger.record_payment(request, metadata).await?)
    }

    /// Logs a month's rent from the payment calendar
    pub async fn log_month(
        &self,
        tenancy_id: TenancyId,
        month: BillingMonth,
        metadata: Option<OperationMetadata>,
    ) -> Result<PaymentLedgerEntry, AppError> {
        Ok(self
            .ledger
            .log_monthly_payment(tenancy_id, month, self.settings.monthly_log_policy, metadata)
            .await?)
    }

    /// Logs the current month according to the business clock
    pub async fn log_current_month(
        &self,
        tenancy_id: TenancyId,
        metadata: Option<OperationMetadata>,
    ) -> Result<PaymentLedgerEntry, AppError> {
        let month = BillingMonth::from_date(self.today());
        self.log_month(tenancy_id, month, metadata).await
    }

    /// Removes a ledger entry; cached status fields are left as they are
    pub async fn delete_payment(
        &self,
        entry_id: PaymentEntryId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), AppError> {
        Ok(self.ledger.delete_entry(entry_id, metadata).await?)
    }

    /// Stores the externally maintained next payment date
    pub async fn set_next_payment_date(
        &self,
        tenancy_id: TenancyId,
        next_payment_date: Option<NaiveDate>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Tenancy, AppError> {
        Ok(self
            .ledger
            .set_next_payment_date(tenancy_id, next_payment_date, metadata)
            .await?)
    }

    pub async fn tenancy_outlook(
        &self,
        tenancy_id: TenancyId,
        metadata: Option<OperationMetadata>,
    ) -> Result<PaymentOutlook, AppError> {
        Ok(self
            .ledger
            .outlook(tenancy_id, self.today(), self.settings.due_soon_window_days, metadata)
            .await?)
    }

    pub async fn payment_calendar(
        &self,
        tenancy_ids: Vec<TenancyId>,
        metadata: Option<OperationMetadata>,
    ) -> Result<PaymentCalendar, AppError> {
        Ok(self
            .ledger
            .calendar(tenancy_ids, self.settings.calendar_look_ahead_months, metadata)
            .await?)
    }

    /// Empty draft dated today in the configured currency
    pub fn new_draft(&self) -> Result<QuotationDraft, AppError> {
        Ok(self.quotations.new_draft(self.settings.currency, self.today())?)
    }

    pub async fn load_draft(
        &self,
        id: QuotationId,
        metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDraft, AppError> {
        Ok(self.quotations.load_draft(id, metadata).await?)
    }

    pub async fn save_quotation(
        &self,
        draft: &mut QuotationDraft,
        metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDocument, AppError> {
        Ok(self.quotations.save(draft, metadata).await?)
    }

    pub async fn transition_quotation(
        &self,
        id: QuotationId,
        status: QuotationStatus,
        metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDocument, AppError> {
        Ok(self.quotations.transition(id, status, metadata).await?)
    }

    /// Saves the draft, then exports exactly what was stored
    ///
    /// Nothing is exported when the save fails. When the export fails the
    /// quotation stays saved and the export error is returned.
    pub async fn save_and_export(
        &self,
        draft: &mut QuotationDraft,
        client: &ClientDetails,
        metadata: Option<OperationMetadata>,
    ) -> Result<SavedExport, AppError> {
        let document = self.save_quotation(draft, metadata).await?;
        let export = self.export_saved(&document, draft.lines(), client)?;
        Ok(SavedExport { document, export })
    }

    /// Exports a stored quotation
    pub async fn export_quotation(
        &self,
        id: QuotationId,
        client: &ClientDetails,
        metadata: Option<OperationMetadata>,
    ) -> Result<ExportedDocument, AppError> {
        let (document, items) = self.quotations.load(id, metadata).await?;
        self.export_saved(&document, &items, client)
    }

    fn export_saved(
        &self,
        document: &QuotationDocument,
        items: &[QuotationLineItem],
        client: &ClientDetails,
    ) -> Result<ExportedDocument, AppError> {
        let renderer = QuotationRenderer::new(self.settings.tax_layout, self.settings.page_budget, self.settings.locale);
        let layout = renderer
            .render(&QuotationRenderInput {
                document,
                items,
                client,
                issuer: &self.settings.issuer,
            })
            .map_err(|e| {
                error!(quotation_id = %document.id, error = %e, "Failed to render quotation");
                e
            })?;
        self.export(layout)
    }

    /// Exports a rent statement as of the current month
    pub async fn export_lease_statement(
        &self,
        tenancy_id: TenancyId,
        tenant: &ClientDetails,
        property_label: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ExportedDocument, AppError> {
        let (tenancy, entries) = self.ledger.tenancy_with_entries(tenancy_id, metadata).await?;
        let renderer = LeaseStatementRenderer::new(self.settings.page_budget, self.settings.locale);
        let layout = renderer.render(&LeaseStatementInput {
            tenancy: &tenancy,
            entries: &entries,
            tenant,
            property_label,
            issuer: &self.settings.issuer,
            as_of: BillingMonth::from_date(self.today()),
        })?;
        self.export(layout)
    }

    fn export(&self, layout: DocumentLayout) -> Result<ExportedDocument, AppError> {
        let exported = self.sink.export(&layout).map_err(|e| {
            error!(document = %layout.file_stem, error = %e, "Document export failed");
            e
        })?;
        info!(
            file_name = %exported.file_name,
            pages = layout.page_count(),
            bytes = exported.len(),
            "Document exported"
        );
        Ok(exported)
    }
}
