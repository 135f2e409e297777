//! Tenancy Domain - rent ledger and lease schedule
//!
//! This crate covers the recurring-rent side of billing:
//! - `Tenancy` leases with cached payment status
//! - The append-only payment ledger
//! - The lease schedule engine (due-soon / overdue, paid months, calendar)
//! - `TenancyLedgerService` for recording and logging payments

pub mod tenancy;
pub mod ledger;
pub mod schedule;
pub mod ports;
pub mod service;
pub mod error;

pub use tenancy::{LeaseStatus, PaymentStatus, Tenancy};
pub use ledger::{NewPaymentEntry, PaymentLedgerEntry, PaymentStatusUpdate, MANUAL_ENTRY_METHOD};
pub use schedule::{
    classify_day_delta, entries_in_month, is_paid, month_is_within_lease, BillingCalendar,
    LeaseSummary, PaymentOutlook, PaymentUrgency, PeriodCell, DEFAULT_DUE_SOON_WINDOW_DAYS,
    DEFAULT_LOOK_AHEAD_MONTHS,
};
pub use ports::{TenancyLedgerPort, TenancyLedgerPortExt, TenancyQuery};
pub use service::{CalendarRow, MonthlyLogPolicy, PaymentCalendar, RecordPaymentRequest, TenancyLedgerService};
pub use error::TenancyError;
