//! Test Data Builders
//!
//! Builders for tenancies, ledger entries and quotation drafts. Tests set
//! only the fields they care about; everything else comes from the
//! standard fixtures.

use chrono::NaiveDate;
use core_kernel::{ClientId, Currency, Money, PaymentEntryId, PropertyId, QuotationId, TenancyId};
use domain_quotation::{QuotationDocument, QuotationDraft, QuotationLineItem, TaxEngine, DEFAULT_TAX_RATE_PERCENT};
use domain_tenancy::{LeaseStatus, PaymentLedgerEntry, PaymentStatus, Tenancy};
use rust_decimal::Decimal;

use crate::fixtures::{DateFixtures, IdFixtures, MoneyFixtures};

/// Builder for constructing test tenancies
pub struct TenancyBuilder {
    id: TenancyId,
    property_id: PropertyId,
    client_id: Option<ClientId>,
    lease_start_date: NaiveDate,
    lease_end_date: NaiveDate,
    rental_amount: Money,
    rent_due_day: u8,
    lease_status: LeaseStatus,
    payment_status: PaymentStatus,
    last_payment_date: Option<NaiveDate>,
    next_payment_date: Option<NaiveDate>,
}

impl Default for TenancyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TenancyBuilder {
    /// Starts from the standard 2025 lease with a fresh id
    pub fn new() -> Self {
        Self {
            id: TenancyId::new_v7(),
            property_id: PropertyId::new(),
            client_id: Some(IdFixtures::client_id()),
            lease_start_date: DateFixtures::lease_start(),
            lease_end_date: DateFixtures::lease_end(),
            rental_amount: MoneyFixtures::monthly_rent(),
            rent_due_day: 1,
            lease_status: LeaseStatus::Active,
            payment_status: PaymentStatus::Current,
            last_payment_date: None,
            next_payment_date: None,
        }
    }

    pub fn with_id(mut self, id: TenancyId) -> Self {
        self.id = id;
        self
    }

    pub fn with_lease(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.lease_start_date = start;
        self.lease_end_date = end;
        self
    }

    pub fn with_rent(mut self, amount: Decimal) -> Self {
        self.rental_amount = Money::new(amount, self.rental_amount.currency());
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.rental_amount = Money::new(self.rental_amount.amount(), currency);
        self
    }

    pub fn with_due_day(mut self, day: u8) -> Self {
        self.rent_due_day = day;
        self
    }

    pub fn with_lease_status(mut self, status: LeaseStatus) -> Self {
        self.lease_status = status;
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = status;
        self
    }

    pub fn with_last_payment_date(mut self, date: NaiveDate) -> Self {
        self.last_payment_date = Some(date);
        self
    }

    pub fn with_next_payment_date(mut self, date: NaiveDate) -> Self {
        self.next_payment_date = Some(date);
        self
    }

    /// Builds through `Tenancy::new`, so invalid combinations panic
    pub fn build(self) -> Tenancy {
        let mut tenancy = Tenancy::new(
            self.property_id,
            self.client_id,
            self.lease_start_date,
            self.lease_end_date,
            self.rental_amount,
            self.rent_due_day,
        )
        .unwrap_or_else(|e| panic!("invalid test tenancy: {}", e));
        tenancy.id = self.id;
        tenancy.lease_status = self.lease_status;
        tenancy.payment_status = self.payment_status;
        tenancy.last_payment_date = self.last_payment_date;
        tenancy.next_payment_date = self.next_payment_date;
        tenancy
    }
}

/// Builder for ledger entries
pub struct PaymentEntryBuilder {
    tenancy_id: TenancyId,
    amount: Money,
    payment_date: NaiveDate,
    payment_method: Option<String>,
    reference_number: Option<String>,
    notes: Option<String>,
}

impl PaymentEntryBuilder {
    /// The tenancy's full rent, paid on `date`
    pub fn for_tenancy(tenancy: &Tenancy, date: NaiveDate) -> Self {
        Self {
            tenancy_id: tenancy.id,
            amount: tenancy.rental_amount,
            payment_date: date,
            payment_method: None,
            reference_number: None,
            notes: None,
        }
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Money::new(amount, self.amount.currency());
        self
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

    pub fn build(self) -> PaymentLedgerEntry {
        PaymentLedgerEntry {
            id: PaymentEntryId::new_v7(),
            tenancy_id: self.tenancy_id,
            amount: self.amount,
            payment_date: self.payment_date,
            payment_method: self.payment_method,
            reference_number: self.reference_number,
            notes: self.notes,
            created_at: DateFixtures::created_at(),
        }
    }
}

struct PlannedLine {
    description: String,
    quantity: Decimal,
    rate: Decimal,
    tax_rate_percent: Decimal,
}

/// Builder for quotation drafts and stored quotations
pub struct QuotationBuilder {
    currency: Currency,
    quotation_date: NaiveDate,
    client_id: Option<ClientId>,
    default_tax_rate: Decimal,
    lines: Vec<PlannedLine>,
}

impl Default for QuotationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotationBuilder {
    pub fn new() -> Self {
        Self {
            currency: Currency::INR,
            quotation_date: DateFixtures::date(2025, 4, 1),
            client_id: Some(IdFixtures::client_id()),
            default_tax_rate: DEFAULT_TAX_RATE_PERCENT,
            lines: Vec::new(),
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.quotation_date = date;
        self
    }

    pub fn for_client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn without_client(mut self) -> Self {
        self.client_id = None;
        self
    }

    pub fn with_default_tax_rate(mut self, rate: Decimal) -> Self {
        self.default_tax_rate = rate;
        self
    }

    /// Adds a line; lines are numbered in the order added
    pub fn line(mut self, description: impl Into<String>, quantity: Decimal, rate: Decimal, tax_rate_percent: Decimal) -> Self {
        self.lines.push(PlannedLine {
            description: description.into(),
            quantity,
            rate,
            tax_rate_percent,
        });
        self
    }

    /// An editable draft, filled through the editor API
    pub fn build_draft(self) -> QuotationDraft {
        let mut document = QuotationDocument::new(self.currency, self.quotation_date);
        document.client_id = self.client_id;
        let mut draft = QuotationDraft::new(document, self.default_tax_rate).unwrap();

        for (index, line) in self.lines.into_iter().enumerate() {
            let id = if index == 0 {
                draft.lines()[0].id
            } else {
                draft.add_line().unwrap()
            };
            draft.set_description(id, line.description).unwrap();
            draft.set_quantity(id, line.quantity).unwrap();
            draft.set_rate(id, line.rate).unwrap();
            draft.set_tax_rate(id, line.tax_rate_percent).unwrap();
        }
        draft
    }

    /// A stored quotation with a number and a matching totals snapshot
    pub fn build_saved(self) -> (QuotationDocument, Vec<QuotationLineItem>) {
        let quotation_id = QuotationId::new_v7();
        let currency = self.currency;
        let mut document = QuotationDocument::new(currency, self.quotation_date);
        document.id = quotation_id;
        document.client_id = self.client_id;
        document.quotation_number = Some("QT-00001".to_string());

        let items: Vec<QuotationLineItem> = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| {
                let mut item = QuotationLineItem::new(
                    quotation_id,
                    line.description,
                    line.quantity,
                    line.rate,
                    line.tax_rate_percent,
                )
                .unwrap();
                item.display_order = index as u32;
                item
            })
            .collect();
        document.apply_totals(&TaxEngine::compute(&items, currency));
        (document, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tenancy_builder_overrides() {
        let tenancy = TenancyBuilder::new()
            .with_rent(dec!(15000))
            .with_due_day(31)
            .with_payment_status(PaymentStatus::Late)
            .build();
        assert_eq!(tenancy.rental_amount.amount(), dec!(15000));
        assert_eq!(tenancy.rent_due_day, 31);
        assert_eq!(tenancy.payment_status, PaymentStatus::Late);
    }

    #[test]
    fn test_quotation_builder_draft_totals() {
        let draft = QuotationBuilder::new()
            .line("Site visit", dec!(2), dec!(500), dec!(18))
            .line("Valuation report", dec!(1), dec!(1000), dec!(12))
            .build_draft();
        assert_eq!(draft.lines().len(), 2);
        assert_eq!(draft.totals().total.amount(), dec!(2300));
    }

    #[test]
    fn test_saved_quotation_orders_lines() {
        let (document, items) = QuotationBuilder::new()
            .line("A", dec!(1), dec!(10), dec!(0))
            .line("B", dec!(1), dec!(20), dec!(0))
            .build_saved();
        assert_eq!(items[1].display_order, 1);
        assert_eq!(document.totals.total.amount(), dec!(30));
    }
}
