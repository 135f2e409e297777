//! Lease schedule engine
//!
//! Pure functions over a tenancy and its ledger entries. Nothing here reads
//! the clock or the store; "today" and the entries are always passed in.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BillingMonth, Money};

use crate::ledger::PaymentLedgerEntry;
use crate::tenancy::Tenancy;

/// Days ahead of the next payment date that count as "due soon"
pub const DEFAULT_DUE_SOON_WINDOW_DAYS: i64 = 5;

/// Months shown past the latest lease end in the payment calendar
pub const DEFAULT_LOOK_AHEAD_MONTHS: u32 = 3;

/// Where a tenancy stands relative to its next payment date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentUrgency {
    /// The date has passed
    Overdue,
    /// Due today or within the window
    DueSoon,
    /// Further out than the window
    Upcoming,
}

/// Classifies a signed day delta (`next_payment_date - today`)
pub fn classify_day_delta(days_until_payment: i64, window_days: i64) -> PaymentUrgency {
    if days_until_payment < 0 {
        PaymentUrgency::Overdue
    } else if days_until_payment <= window_days {
        PaymentUrgency::DueSoon
    } else {
        PaymentUrgency::Upcoming
    }
}

/// Payment-date view of one tenancy as of a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutlook {
    pub next_payment_date: Option<NaiveDate>,
    pub days_until_payment: Option<i64>,
    pub urgency: Option<PaymentUrgency>,
}

impl PaymentOutlook {
    /// Evaluates the stored `next_payment_date` against `today`
    ///
    /// When the tenancy has no next payment date, every field is `None` and
    /// neither flag is set.
    pub fn evaluate(tenancy: &Tenancy, today: NaiveDate, window_days: i64) -> Self {
        let next_payment_date = tenancy.next_payment_date;
        let days_until_payment = next_payment_date.map(|next| (next - today).num_days());
        let urgency = days_until_payment.map(|days| classify_day_delta(days, window_days));

        Self {
            next_payment_date,
            days_until_payment,
            urgency,
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.urgency == Some(PaymentUrgency::Overdue)
    }

    pub fn is_due_soon(&self) -> bool {
        self.urgency == Some(PaymentUrgency::DueSoon)
    }
}

/// True when `month` lies between the lease start and end months, inclusive
///
/// Partial months at either end count as within the lease.
pub fn month_is_within_lease(tenancy: &Tenancy, month: BillingMonth) -> bool {
    tenancy.first_month() <= month && month <= tenancy.last_month()
}

/// Entries whose payment date falls inside `month`
pub fn entries_in_month(
    entries: &[PaymentLedgerEntry],
    month: BillingMonth,
) -> impl Iterator<Item = &PaymentLedgerEntry> {
    entries.iter().filter(move |entry| entry.falls_in(month))
}

/// True when at least one entry is dated inside `month`
///
/// Existence only: a partial payment or several payments still count as paid.
pub fn is_paid(entries: &[PaymentLedgerEntry], month: BillingMonth) -> bool {
    entries_in_month(entries, month).next().is_some()
}

fn received_in(tenancy: &Tenancy, entries: &[PaymentLedgerEntry], month: BillingMonth) -> Money {
    let total: Decimal = entries_in_month(entries, month)
        .map(|entry| entry.amount.amount())
        .sum();
    Money::new(total, tenancy.rental_amount.currency())
}

/// One month of one tenancy in the payment calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodCell {
    pub month: BillingMonth,
    pub within_lease: bool,
    pub paid: bool,
    /// Rent due date inside the month, only for months within the lease
    pub due_date: Option<NaiveDate>,
    pub amount_received: Money,
}

/// The span of billing periods shown together for a set of tenancies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingCalendar {
    pub first: BillingMonth,
    pub last: BillingMonth,
}

impl BillingCalendar {
    /// Earliest lease start month through the latest lease end month, then
    /// `look_ahead_months` more
    ///
    /// Returns `None` for an empty tenancy set.
    pub fn spanning(tenancies: &[Tenancy], look_ahead_months: u32) -> Option<Self> {
        let first = tenancies.iter().map(Tenancy::first_month).min()?;
        let latest_end = tenancies.iter().map(Tenancy::last_month).max()?;
        let last = latest_end.add_months(look_ahead_months).unwrap_or(latest_end);
        Some(Self { first, last })
    }

    pub fn months(&self) -> impl Iterator<Item = BillingMonth> {
        self.first.through(self.last)
    }

    pub fn len(&self) -> usize {
        self.months().count()
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    /// One cell per calendar month for `tenancy`
    ///
    /// Entries belonging to other tenancies are ignored.
    pub fn row(&self, tenancy: &Tenancy, entries: &[PaymentLedgerEntry]) -> Vec<PeriodCell> {
        let own: Vec<PaymentLedgerEntry> = entries
            .iter()
            .filter(|entry| entry.tenancy_id == tenancy.id)
            .cloned()
            .collect();

        self.months()
            .map(|month| {
                let within_lease = month_is_within_lease(tenancy, month);
                PeriodCell {
                    month,
                    within_lease,
                    paid: is_paid(&own, month),
                    due_date: within_lease.then(|| tenancy.due_date_in(month)),
                    amount_received: received_in(tenancy, &own, month),
                }
            })
            .collect()
    }
}

/// Month-level roll-up of a lease against its ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseSummary {
    pub months_in_lease: u32,
    pub months_paid: u32,
    /// Lease months up to the cut-off with no entry
    pub unpaid_months: Vec<BillingMonth>,
    pub total_received: Money,
    pub payments_count: usize,
    /// Entries dated outside the lease months; counted in the total only
    pub entries_outside_lease: usize,
}

impl LeaseSummary {
    /// Summarizes `tenancy` with unpaid months reported up to `as_of`
    pub fn compute(tenancy: &Tenancy, entries: &[PaymentLedgerEntry], as_of: BillingMonth) -> Self {
        let own: Vec<PaymentLedgerEntry> = entries
            .iter()
            .filter(|entry| entry.tenancy_id == tenancy.id)
            .cloned()
            .collect();

        let mut months_in_lease = 0;
        let mut months_paid = 0;
        let mut unpaid_months = Vec::new();
        for month in tenancy.first_month().through(tenancy.last_month()) {
            months_in_lease += 1;
            if is_paid(&own, month) {
                months_paid += 1;
            } else if month <= as_of {
                unpaid_months.push(month);
            }
        }

        let total: Decimal = own.iter().map(|entry| entry.amount.amount()).sum();
        let entries_outside_lease = own
            .iter()
            .filter(|entry| !month_is_within_lease(tenancy, entry.billing_month()))
            .count();

        Self {
            months_in_lease,
            months_paid,
            unpaid_months,
            total_received: Money::new(total, tenancy.rental_amount.currency()),
            payments_count: own.len(),
            entries_outside_lease,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn overdue_and_due_soon_are_exclusive(delta in -400i64..400, window in 0i64..30) {
            let urgency = classify_day_delta(delta, window);
            let overdue = urgency == PaymentUrgency::Overdue;
            let due_soon = urgency == PaymentUrgency::DueSoon;
            prop_assert!(!(overdue && due_soon));
            prop_assert_eq!(overdue, delta < 0);
            prop_assert_eq!(due_soon, (0..=window).contains(&delta));
        }
    }
}
