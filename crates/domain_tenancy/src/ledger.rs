//! Rent payment ledger entries
//!
//! The ledger is the source of truth for "was this month paid". Entries are
//! append-only apart from explicit deletion and are never edited in place.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BillingMonth, Money, PaymentEntryId, TenancyId};

use crate::tenancy::PaymentStatus;

/// Payment method stamped on entries created by the monthly quick-log action
pub const MANUAL_ENTRY_METHOD: &str = "Manual Entry";

/// A recorded rent payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLedgerEntry {
    pub id: PaymentEntryId,
    pub tenancy_id: TenancyId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentLedgerEntry {
    /// Calendar month the payment is counted against
    pub fn billing_month(&self) -> BillingMonth {
        BillingMonth::from_date(self.payment_date)
    }

    pub fn falls_in(&self, month: BillingMonth) -> bool {
        month.contains(self.payment_date)
    }
}

/// An entry that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPaymentEntry {
    pub tenancy_id: TenancyId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

impl NewPaymentEntry {
    pub fn new(tenancy_id: TenancyId, amount: Money, payment_date: NaiveDate) -> Self {
        Self {
            tenancy_id,
            amount,
            payment_date,
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

    /// Materializes the entry once the store has assigned its identity
    pub fn into_entry(self, id: PaymentEntryId, created_at: DateTime<Utc>) -> PaymentLedgerEntry {
        PaymentLedgerEntry {
            id,
            tenancy_id: self.tenancy_id,
            amount: self.amount,
            payment_date: self.payment_date,
            payment_method: self.payment_method,
            reference_number: self.reference_number,
            notes: self.notes,
            created_at,
        }
    }
}

/// Cached tenancy fields written together with a recorded payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusUpdate {
    pub last_payment_date: NaiveDate,
    pub payment_status: PaymentStatus,
}

impl PaymentStatusUpdate {
    /// The refresh applied after a payment lands on `payment_date`
    pub fn paid_on(payment_date: NaiveDate) -> Self {
        Self {
            last_payment_date: payment_date,
            payment_status: PaymentStatus::Current,
        }
    }
}
