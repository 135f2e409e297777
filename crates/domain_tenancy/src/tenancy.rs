//! Tenancy aggregate
//!
//! A `Tenancy` is one lease. Besides its contractual terms it caches two
//! derived fields, `payment_status` and `last_payment_date`, which are only
//! refreshed by the record-payment operation. `next_payment_date` is
//! maintained outside the reconciliation flow and is read here as input.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{BillingMonth, ClientId, Money, PropertyId, TenancyId};

use crate::error::TenancyError;
use crate::ledger::PaymentStatusUpdate;

/// Contractual state of the lease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Active,
    Expired,
    Terminated,
    Renewed,
}

impl LeaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseStatus::Active => "active",
            LeaseStatus::Expired => "expired",
            LeaseStatus::Terminated => "terminated",
            LeaseStatus::Renewed => "renewed",
        }
    }
}

impl fmt::Display for LeaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaseStatus {
    type Err = TenancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LeaseStatus::Active),
            "expired" => Ok(LeaseStatus::Expired),
            "terminated" => Ok(LeaseStatus::Terminated),
            "renewed" => Ok(LeaseStatus::Renewed),
            other => Err(TenancyError::validation(format!("Unknown lease status '{}'", other))),
        }
    }
}

/// Cached payment standing of the tenancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Current,
    Late,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Current => "current",
            PaymentStatus::Late => "late",
            PaymentStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = TenancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(PaymentStatus::Current),
            "late" => Ok(PaymentStatus::Late),
            "overdue" => Ok(PaymentStatus::Overdue),
            other => Err(TenancyError::validation(format!("Unknown payment status '{}'", other))),
        }
    }
}

/// One lease between the business and a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenancy {
    pub id: TenancyId,
    pub property_id: PropertyId,
    pub client_id: Option<ClientId>,
    /// First day of the lease (inclusive)
    pub lease_start_date: NaiveDate,
    /// Last day of the lease (inclusive)
    pub lease_end_date: NaiveDate,
    /// Fixed monthly charge
    pub rental_amount: Money,
    /// Day of month rent falls due, 1-31, clamped to the month length
    pub rent_due_day: u8,
    pub lease_status: LeaseStatus,
    pub payment_status: PaymentStatus,
    pub last_payment_date: Option<NaiveDate>,
    pub next_payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenancy {
    /// Creates an active tenancy at lease signing
    ///
    /// # Errors
    ///
    /// Returns `TenancyError::Validation` when the lease ends before it
    /// starts, the rent is not positive, or the due day is outside 1-31.
    pub fn new(
        property_id: PropertyId,
        client_id: Option<ClientId>,
        lease_start_date: NaiveDate,
        lease_end_date: NaiveDate,
        rental_amount: Money,
        rent_due_day: u8,
    ) -> Result<Self, TenancyError> {
        if lease_end_date < lease_start_date {
            return Err(TenancyError::validation(format!(
                "Lease end {} is before lease start {}",
                lease_end_date, lease_start_date
            )));
        }
        if !rental_amount.is_positive() {
            return Err(TenancyError::validation("Rental amount must be greater than zero"));
        }
        if !(1..=31).contains(&rent_due_day) {
            return Err(TenancyError::validation(format!(
                "Rent due day {} must be between 1 and 31",
                rent_due_day
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: TenancyId::new_v7(),
            property_id,
            client_id,
            lease_start_date,
            lease_end_date,
            rental_amount,
            rent_due_day,
            lease_status: LeaseStatus::Active,
            payment_status: PaymentStatus::Current,
            last_payment_date: None,
            next_payment_date: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Sets the externally maintained next payment date
    pub fn with_next_payment_date(mut self, date: NaiveDate) -> Self {
        self.next_payment_date = Some(date);
        self
    }

    pub fn first_month(&self) -> BillingMonth {
        BillingMonth::from_date(self.lease_start_date)
    }

    pub fn last_month(&self) -> BillingMonth {
        BillingMonth::from_date(self.lease_end_date)
    }

    /// Rent due date inside `month`, with the due day clamped to its length
    ///
    /// This is a display value only; it never feeds `next_payment_date`.
    pub fn due_date_in(&self, month: BillingMonth) -> NaiveDate {
        month.clamped_day(u32::from(self.rent_due_day))
    }

    /// Applies the cached-field refresh made by the record-payment operation
    pub fn apply_status_update(&mut self, update: &PaymentStatusUpdate) {
        self.last_payment_date = Some(update.last_payment_date);
        self.payment_status = update.payment_status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rent() -> Money {
        Money::new(dec!(20000), Currency::INR)
    }

    #[test]
    fn test_new_tenancy_defaults() {
        let t = Tenancy::new(PropertyId::new(), None, date(2025, 1, 1), date(2025, 12, 31), rent(), 5)
            .unwrap();
        assert_eq!(t.lease_status, LeaseStatus::Active);
        assert_eq!(t.payment_status, PaymentStatus::Current);
        assert!(t.last_payment_date.is_none());
        assert!(t.next_payment_date.is_none());
    }

    #[test]
    fn test_rejects_inverted_lease() {
        let result = Tenancy::new(PropertyId::new(), None, date(2025, 12, 31), date(2025, 1, 1), rent(), 5);
        assert!(matches!(result, Err(TenancyError::Validation(_))));
    }

    #[test]
    fn test_rejects_due_day_out_of_range() {
        for day in [0u8, 32] {
            let result = Tenancy::new(PropertyId::new(), None, date(2025, 1, 1), date(2025, 12, 31), rent(), day);
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_rejects_zero_rent() {
        let result = Tenancy::new(
            PropertyId::new(),
            None,
            date(2025, 1, 1),
            date(2025, 12, 31),
            Money::zero(Currency::INR),
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_due_date_is_clamped() {
        let t = Tenancy::new(PropertyId::new(), None, date(2025, 1, 1), date(2025, 12, 31), rent(), 31)
            .unwrap();
        let feb = BillingMonth::new(2025, 2).unwrap();
        assert_eq!(t.due_date_in(feb), date(2025, 2, 28));
        let mar = BillingMonth::new(2025, 3).unwrap();
        assert_eq!(t.due_date_in(mar), date(2025, 3, 31));
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [PaymentStatus::Current, PaymentStatus::Late, PaymentStatus::Overdue] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        for status in [
            LeaseStatus::Active,
            LeaseStatus::Expired,
            LeaseStatus::Terminated,
            LeaseStatus::Renewed,
        ] {
            assert_eq!(status.as_str().parse::<LeaseStatus>().unwrap(), status);
        }
        assert!("paid".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_like_store_value() {
        assert_eq!(serde_json::to_string(&PaymentStatus::Overdue).unwrap(), "\"overdue\"");
        assert_eq!(serde_json::to_string(&LeaseStatus::Renewed).unwrap(), "\"renewed\"");
    }
}
