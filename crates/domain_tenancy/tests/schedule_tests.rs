//! Lease schedule scenarios over plain ledger data

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;

use core_kernel::{BillingMonth, Currency, Money, PaymentEntryId, PropertyId};
use domain_tenancy::{
    is_paid, month_is_within_lease, BillingCalendar, LeaseSummary, NewPaymentEntry,
    PaymentLedgerEntry, PaymentOutlook, PaymentUrgency, Tenancy,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month(s: &str) -> BillingMonth {
    s.parse().unwrap()
}

fn lease_2025() -> Tenancy {
    Tenancy::new(
        PropertyId::new(),
        None,
        date(2025, 1, 1),
        date(2025, 12, 31),
        Money::new(dec!(20000), Currency::INR),
        1,
    )
    .unwrap()
}

fn entry(tenancy: &Tenancy, on: NaiveDate) -> PaymentLedgerEntry {
    NewPaymentEntry::new(tenancy.id, tenancy.rental_amount, on)
        .into_entry(PaymentEntryId::new(), Utc::now())
}

mod paid_month_tests {
    use super::*;

    #[test]
    fn test_single_mid_month_payment() {
        let tenancy = lease_2025();
        let entries = vec![entry(&tenancy, date(2025, 3, 15))];

        assert!(is_paid(&entries, month("2025-03")));
        assert!(!is_paid(&entries, month("2025-02")));
    }

    #[test]
    fn test_no_entries_means_unpaid() {
        assert!(!is_paid(&[], month("2025-03")));
    }

    #[test]
    fn test_multiple_entries_in_one_month_still_paid() {
        let tenancy = lease_2025();
        let entries = vec![
            entry(&tenancy, date(2025, 3, 1)),
            entry(&tenancy, date(2025, 3, 31)),
        ];
        assert!(is_paid(&entries, month("2025-03")));
        assert!(!is_paid(&entries, month("2025-04")));
    }
}

mod lease_window_tests {
    use super::*;

    #[test]
    fn test_full_year_lease_months() {
        let tenancy = lease_2025();
        assert!(month_is_within_lease(&tenancy, month("2025-01")));
        assert!(month_is_within_lease(&tenancy, month("2025-12")));
        assert!(!month_is_within_lease(&tenancy, month("2026-01")));
    }

    #[test]
    fn test_calendar_row_includes_look_ahead_months() {
        let tenancy = lease_2025();
        let calendar = BillingCalendar::spanning(std::slice::from_ref(&tenancy), 3).unwrap();
        let row = calendar.row(&tenancy, &[entry(&tenancy, date(2025, 3, 15))]);

        assert_eq!(row.len(), 15);
        assert_eq!(row.iter().filter(|c| c.within_lease).count(), 12);
        assert_eq!(row.iter().filter(|c| c.paid).count(), 1);
    }

    #[test]
    fn test_summary_of_one_paid_month() {
        let tenancy = lease_2025();
        let summary = LeaseSummary::compute(&tenancy, &[entry(&tenancy, date(2025, 3, 15))], month("2025-04"));
        assert_eq!(summary.months_paid, 1);
        assert_eq!(
            summary.unpaid_months,
            vec![month("2025-01"), month("2025-02"), month("2025-04")]
        );
    }
}

mod outlook_tests {
    use super::*;

    #[test]
    fn test_due_today_is_due_soon() {
        let tenancy = lease_2025().with_next_payment_date(date(2025, 5, 1));
        let outlook = PaymentOutlook::evaluate(&tenancy, date(2025, 5, 1), 5);
        assert_eq!(outlook.days_until_payment, Some(0));
        assert_eq!(outlook.urgency, Some(PaymentUrgency::DueSoon));
    }

    #[test]
    fn test_far_future_is_upcoming() {
        let tenancy = lease_2025().with_next_payment_date(date(2025, 5, 20));
        let outlook = PaymentOutlook::evaluate(&tenancy, date(2025, 5, 1), 5);
        assert_eq!(outlook.urgency, Some(PaymentUrgency::Upcoming));
        assert!(!outlook.is_due_soon());
        assert!(!outlook.is_overdue());
    }
}
