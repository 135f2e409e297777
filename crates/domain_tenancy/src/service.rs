//! Tenancy ledger service
//!
//! Validates payment requests, enforces the one-entry-per-month rule of the
//! monthly shortcut, and builds the outlook and calendar read models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

use core_kernel::{BillingMonth, Money, OperationMetadata, PaymentEntryId, TenancyId};

use crate::error::TenancyError;
use crate::ledger::{NewPaymentEntry, PaymentLedgerEntry, PaymentStatusUpdate, MANUAL_ENTRY_METHOD};
use crate::ports::{TenancyLedgerPort, TenancyLedgerPortExt, TenancyQuery};
use crate::schedule::{month_is_within_lease, BillingCalendar, PaymentOutlook, PeriodCell};
use crate::tenancy::Tenancy;

/// Whether the monthly shortcut refreshes the tenancy's cached status fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyLogPolicy {
    /// Only the ledger entry is written
    #[default]
    LedgerOnly,
    /// Written through the record-payment path, updating status fields
    UpdateStatus,
}

impl MonthlyLogPolicy {
    pub fn from_flag(updates_status: bool) -> Self {
        if updates_status {
            MonthlyLogPolicy::UpdateStatus
        } else {
            MonthlyLogPolicy::LedgerOnly
        }
    }
}

/// A payment received against a tenancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub tenancy_id: TenancyId,
    pub amount: Decimal,
    pub payment_date: Option<NaiveDate>,
    #[validate(length(max = 64))]
    pub payment_method: Option<String>,
    #[validate(length(max = 64))]
    pub reference_number: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl RecordPaymentRequest {
    pub fn new(tenancy_id: TenancyId, amount: Decimal, payment_date: NaiveDate) -> Self {
        Self {
            tenancy_id,
            amount,
            payment_date: Some(payment_date),
            payment_method: None,
            reference_number: None,
            notes: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_number = Some(reference.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Checks every rule that can be decided without the store
    fn check(&self) -> Result<NaiveDate, TenancyError> {
        if self.amount <= Decimal::ZERO {
            return Err(TenancyError::validation("Payment amount must be greater than zero"));
        }
        let payment_date = self
            .payment_date
            .ok_or_else(|| TenancyError::validation("Payment date is required"))?;
        self.validate()
            .map_err(|e| TenancyError::validation(e.to_string()))?;
        Ok(payment_date)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Calendar read model: the shared month span plus one row per tenancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCalendar {
    pub calendar: Option<BillingCalendar>,
    pub rows: Vec<CalendarRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRow {
    pub tenancy: Tenancy,
    pub cells: Vec<PeriodCell>,
}

/// Application service over the tenancy ledger port
pub struct TenancyLedgerService {
    port: Arc<dyn TenancyLedgerPort>,
}

impl TenancyLedgerService {
    pub fn new(port: Arc<dyn TenancyLedgerPort>) -> Self {
        Self { port }
    }

    /// Records a payment and refreshes the tenancy's cached status
    ///
    /// The ledger insert and the status update happen in one port call.
    /// `next_payment_date` is never touched here.
    ///
    /// # Errors
    ///
    /// `Validation` when the amount is not positive, the date is missing or a
    /// text field is too long; nothing is written in that case.
    /// `Persistence` when the store fails; neither write is applied.
    pub async fn record_payment(
        &self,
        request: RecordPaymentRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<(PaymentLedgerEntry, Tenancy), TenancyError> {
        let payment_date = request.check().map_err(|e| {
            warn!(tenancy_id = %request.tenancy_id, amount = %request.amount, error = %e, "Rejected payment");
            e
        })?;

        let tenancy = self.port.get_tenancy(request.tenancy_id, metadata.clone()).await?;
        let entry = NewPaymentEntry {
            tenancy_id: tenancy.id,
            amount: Money::new(request.amount, tenancy.rental_amount.currency()),
            payment_date,
            payment_method: non_blank(request.payment_method),
            reference_number: non_blank(request.reference_number),
            notes: non_blank(request.notes),
        };

        let correlation = metadata.as_ref().map(|m| m.correlation().to_string());
        match self
            .port
            .record_payment(entry, PaymentStatusUpdate::paid_on(payment_date), metadata)
            .await
        {
            Ok((entry, tenancy)) => {
                info!(
                    tenancy_id = %tenancy.id,
                    entry_id = %entry.id,
                    amount = %entry.amount,
                    payment_date = %entry.payment_date,
                    correlation_id = correlation.as_deref().unwrap_or("-"),
                    "Payment recorded"
                );
                Ok((entry, tenancy))
            }
            Err(e) => {
                error!(tenancy_id = %tenancy.id, error = %e, "Failed to record payment");
                Err(e.into())
            }
        }
    }

    /// Logs the month's rent from the payment calendar
    ///
    /// Refuses when any entry already falls in `month`. The entry is dated the
    /// first of the month for the full rental amount.
    pub async fn log_monthly_payment(
        &self,
        tenancy_id: TenancyId,
        month: BillingMonth,
        policy: MonthlyLogPolicy,
        metadata: Option<OperationMetadata>,
    ) -> Result<PaymentLedgerEntry, TenancyError> {
        let tenancy = self.port.get_tenancy(tenancy_id, metadata.clone()).await?;

        let existing = self
            .port
            .entries_in_month(tenancy_id, month, metadata.clone())
            .await?;
        if !existing.is_empty() {
            warn!(tenancy_id = %tenancy_id, month = %month, existing = existing.len(), "Month already logged");
            return Err(TenancyError::AlreadyLogged { tenancy_id, month });
        }
        if !month_is_within_lease(&tenancy, month) {
            warn!(tenancy_id = %tenancy_id, month = %month, "Logging a month outside the lease");
        }

        let entry = NewPaymentEntry::new(tenancy_id, tenancy.rental_amount, month.first_day())
            .with_method(MANUAL_ENTRY_METHOD);

        let written = match policy {
            MonthlyLogPolicy::LedgerOnly => self.port.append_entry(entry, metadata).await,
            MonthlyLogPolicy::UpdateStatus => self
                .port
                .record_payment(entry, PaymentStatusUpdate::paid_on(month.first_day()), metadata)
                .await
                .map(|(entry, _)| entry),
        };

        match written {
            Ok(entry) => {
                info!(tenancy_id = %tenancy_id, month = %month, entry_id = %entry.id, ?policy, "Monthly payment logged");
                Ok(entry)
            }
            Err(e) => {
                error!(tenancy_id = %tenancy_id, month = %month, error = %e, "Failed to log monthly payment");
                Err(e.into())
            }
        }
    }

    /// Deletes a ledger entry; cached status fields are left as they are
    pub async fn delete_entry(
        &self,
        entry_id: PaymentEntryId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), TenancyError> {
        self.port.delete_entry(entry_id, metadata).await.map_err(|e| {
            error!(entry_id = %entry_id, error = %e, "Failed to delete ledger entry");
            TenancyError::from(e)
        })?;
        info!(entry_id = %entry_id, "Ledger entry deleted");
        Ok(())
    }

    /// Sets the externally maintained next payment date
    pub async fn set_next_payment_date(
        &self,
        tenancy_id: TenancyId,
        next_payment_date: Option<NaiveDate>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Tenancy, TenancyError> {
        let tenancy = self
            .port
            .update_next_payment_date(tenancy_id, next_payment_date, metadata)
            .await?;
        info!(tenancy_id = %tenancy_id, next_payment_date = ?next_payment_date, "Next payment date updated");
        Ok(tenancy)
    }

    pub async fn outlook(
        &self,
        tenancy_id: TenancyId,
        today: NaiveDate,
        window_days: i64,
        metadata: Option<OperationMetadata>,
    ) -> Result<PaymentOutlook, TenancyError> {
        let tenancy = self.port.get_tenancy(tenancy_id, metadata).await?;
        Ok(PaymentOutlook::evaluate(&tenancy, today, window_days))
    }

    /// Builds the payment calendar for the given tenancies
    ///
    /// Unknown ids are skipped. An empty result has no calendar span.
    pub async fn calendar(
        &self,
        tenancy_ids: Vec<TenancyId>,
        look_ahead_months: u32,
        metadata: Option<OperationMetadata>,
    ) -> Result<PaymentCalendar, TenancyError> {
        let tenancies = self
            .port
            .list_tenancies(TenancyQuery::by_ids(tenancy_ids), metadata.clone())
            .await?;
        let calendar = BillingCalendar::spanning(&tenancies, look_ahead_months);

        let mut rows = Vec::with_capacity(tenancies.len());
        for tenancy in tenancies {
            let cells = match calendar {
                Some(ref calendar) => {
                    let entries = self.port.list_entries(tenancy.id, metadata.clone()).await?;
                    calendar.row(&tenancy, &entries)
                }
                None => Vec::new(),
            };
            rows.push(CalendarRow { tenancy, cells });
        }

        Ok(PaymentCalendar { calendar, rows })
    }

    pub async fn tenancy_with_entries(
        &self,
        tenancy_id: TenancyId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(Tenancy, Vec<PaymentLedgerEntry>), TenancyError> {
        let tenancy = self.port.get_tenancy(tenancy_id, metadata.clone()).await?;
        let entries = self.port.list_entries(tenancy_id, metadata).await?;
        Ok((tenancy, entries))
    }
}
