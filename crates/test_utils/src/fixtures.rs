//! Pre-built Test Fixtures
//!
//! Ready-to-use data for the scenarios the billing core is specified
//! against: a 2025 lease at ₹20,000 a month with a March payment, and the
//! two-line GST quotation whose total is ₹2,300.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{BillingMonth, ClientId, Currency, Money, PaymentEntryId, PropertyId, QuotationId, TenancyId};
use domain_documents::{ClientDetails, IssuerDetails};
use domain_quotation::{QuotationDocument, QuotationLineItem, TaxEngine};
use domain_tenancy::{PaymentLedgerEntry, Tenancy};
use fake::faker::address::en::{CityName, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::name::en::Name;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn inr(amount: Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    /// Monthly rent of the standard lease
    pub fn monthly_rent() -> Money {
        Self::inr(dec!(20000))
    }

    pub fn inr_zero() -> Money {
        Money::zero(Currency::INR)
    }

    /// A USD amount for currency mismatch tests
    pub fn usd_100() -> Money {
        Money::new(dec!(100), Currency::USD)
    }
}

/// Fixture for calendar test data
pub struct DateFixtures;

impl DateFixtures {
    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    pub fn month(year: i32, month: u32) -> BillingMonth {
        BillingMonth::new(year, month).unwrap()
    }

    pub fn lease_start() -> NaiveDate {
        Self::date(2025, 1, 1)
    }

    pub fn lease_end() -> NaiveDate {
        Self::date(2025, 12, 31)
    }

    /// The one ledger entry of the standard scenario
    pub fn march_payment() -> NaiveDate {
        Self::date(2025, 3, 15)
    }

    /// A working day in the middle of the lease
    pub fn mid_lease_today() -> NaiveDate {
        Self::date(2025, 4, 10)
    }

    pub fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    pub fn tenancy_id() -> TenancyId {
        TenancyId::from_uuid(Uuid::parse_str("7d1c4a2e-0b6f-4c1e-9a51-000000000001").unwrap())
    }

    pub fn property_id() -> PropertyId {
        PropertyId::from_uuid(Uuid::parse_str("7d1c4a2e-0b6f-4c1e-9a51-000000000002").unwrap())
    }

    pub fn client_id() -> ClientId {
        ClientId::from_uuid(Uuid::parse_str("7d1c4a2e-0b6f-4c1e-9a51-000000000003").unwrap())
    }

    pub fn quotation_id() -> QuotationId {
        QuotationId::from_uuid(Uuid::parse_str("7d1c4a2e-0b6f-4c1e-9a51-000000000004").unwrap())
    }
}

/// Fixture for tenancies and their ledger
pub struct TenancyFixtures;

impl TenancyFixtures {
    /// Lease 2025-01-01 to 2025-12-31, ₹20,000 due on the 1st
    pub fn standard_lease() -> Tenancy {
        let mut tenancy = Tenancy::new(
            IdFixtures::property_id(),
            Some(IdFixtures::client_id()),
            DateFixtures::lease_start(),
            DateFixtures::lease_end(),
            MoneyFixtures::monthly_rent(),
            1,
        )
        .unwrap();
        tenancy.id = IdFixtures::tenancy_id();
        tenancy
    }

    /// An entry for `tenancy` dated `date`, for the monthly rent
    pub fn entry_on(tenancy: &Tenancy, date: NaiveDate) -> PaymentLedgerEntry {
        PaymentLedgerEntry {
            id: PaymentEntryId::new_v7(),
            tenancy_id: tenancy.id,
            amount: tenancy.rental_amount,
            payment_date: date,
            payment_method: Some("Bank Transfer".to_string()),
            reference_number: None,
            notes: None,
            created_at: DateFixtures::created_at(),
        }
    }

    /// The 2025-03-15 payment of the standard lease
    pub fn march_entry(tenancy: &Tenancy) -> PaymentLedgerEntry {
        Self::entry_on(tenancy, DateFixtures::march_payment())
    }
}

/// Fixture for quotations
pub struct QuotationFixtures;

impl QuotationFixtures {
    /// Two lines: 2 x ₹500 at 18% and 1 x ₹1,000 at 12%
    pub fn gst_sample_items(quotation_id: QuotationId) -> Vec<QuotationLineItem> {
        let mut site_visit = QuotationLineItem::new(quotation_id, "Site visit", dec!(2), dec!(500), dec!(18)).unwrap();
        site_visit.display_order = 0;
        let mut valuation =
            QuotationLineItem::new(quotation_id, "Valuation report", dec!(1), dec!(1000), dec!(12)).unwrap();
        valuation.display_order = 1;
        vec![site_visit, valuation]
    }

    /// A saved quotation whose stored totals match `items`
    pub fn saved_document(items: &[QuotationLineItem]) -> QuotationDocument {
        let mut document = QuotationDocument::new(Currency::INR, DateFixtures::date(2025, 4, 1))
            .for_client(IdFixtures::client_id());
        if let Some(first) = items.first() {
            document.id = first.quotation_id;
        }
        document.quotation_number = Some("QT-00001".to_string());
        document.apply_totals(&TaxEngine::compute(items, Currency::INR));
        document
    }

    /// The standard sample as stored: document plus items
    pub fn gst_sample() -> (QuotationDocument, Vec<QuotationLineItem>) {
        let items = Self::gst_sample_items(IdFixtures::quotation_id());
        (Self::saved_document(&items), items)
    }
}

/// Fixture for parties printed on documents
pub struct PartyFixtures;

impl PartyFixtures {
    pub fn issuer() -> IssuerDetails {
        IssuerDetails {
            name: "Acme Realty".to_string(),
            address: Some("12 MG Road\nBengaluru 560001".to_string()),
            phone: Some("+91 80 4000 1234".to_string()),
            email: Some("accounts@acmerealty.in".to_string()),
            tax_id: Some("29ABCDE1234F1Z5".to_string()),
        }
    }

    pub fn client() -> ClientDetails {
        ClientDetails {
            name: "R. Sharma".to_string(),
            address: Some("Flat 4B, Lake View Apartments".to_string()),
            ..Default::default()
        }
    }

    /// A client with randomly generated name and address
    pub fn random_client() -> ClientDetails {
        let street: String = StreetName().fake();
        let city: String = CityName().fake();
        ClientDetails {
            name: Name().fake(),
            address: Some(format!("{}\n{}", street, city)),
            ..Default::default()
        }
    }

    pub fn random_issuer() -> IssuerDetails {
        IssuerDetails::new(CompanyName().fake::<String>())
    }
}
