//! Property-Based Test Generators
//!
//! Proptest strategies that only produce values the domain constructors
//! accept, so properties can be stated over valid inputs.

use chrono::NaiveDate;
use core_kernel::{BillingMonth, Currency, Money, QuotationId};
use domain_quotation::QuotationLineItem;
use domain_tenancy::{PaymentLedgerEntry, Tenancy};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::builders::PaymentEntryBuilder;

/// Strategy for currencies with two decimal places
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::INR),
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
    ]
}

/// Positive rupee amounts with paise
pub fn positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|paise| Decimal::new(paise, 2))
}

pub fn inr_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_strategy().prop_map(|amount| Money::new(amount, Currency::INR))
}

/// Quantities from 0 to 9,999 with up to three decimals
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 3))
}

/// Unit rates from 0 to ₹99,99,999.99
pub fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// The usual GST slabs plus arbitrary two-decimal percentages
pub fn tax_rate_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        3 => prop::sample::select(vec![0i64, 5, 12, 18, 28]).prop_map(Decimal::from),
        1 => (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 2)),
    ]
}

/// A valid line item for `quotation_id`
pub fn line_item_strategy(quotation_id: QuotationId) -> impl Strategy<Value = QuotationLineItem> {
    ("[a-z ]{0,24}", quantity_strategy(), rate_strategy(), tax_rate_strategy()).prop_map(
        move |(description, quantity, rate, tax)| {
            QuotationLineItem::new(quotation_id, description, quantity, rate, tax).unwrap()
        },
    )
}

/// One to `max` line items of one quotation, numbered in order
pub fn line_items_strategy(max: usize) -> impl Strategy<Value = Vec<QuotationLineItem>> {
    let quotation_id = QuotationId::new();
    prop::collection::vec(line_item_strategy(quotation_id), 1..=max.max(1)).prop_map(|mut items| {
        for (index, item) in items.iter_mut().enumerate() {
            item.display_order = index as u32;
        }
        items
    })
}

/// Billing months between 2000 and 2099
pub fn billing_month_strategy() -> impl Strategy<Value = BillingMonth> {
    (2000i32..2100i32, 1u32..=12u32).prop_map(|(year, month)| BillingMonth::new(year, month).unwrap())
}

/// Any calendar date between 2000 and 2099
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (billing_month_strategy(), 1u32..=31u32).prop_map(|(month, day)| month.clamped_day(day))
}

/// Any day inside `month`
pub fn date_in_month_strategy(month: BillingMonth) -> impl Strategy<Value = NaiveDate> {
    (1u32..=month.days()).prop_map(move |day| month.clamped_day(day))
}

/// Day deltas around the due-soon window
pub fn day_delta_strategy() -> impl Strategy<Value = i64> {
    -400i64..400i64
}

/// Rent due days, including the ones that clamp in short months
pub fn due_day_strategy() -> impl Strategy<Value = u8> {
    1u8..=31u8
}

/// Zero to `max` entries for `tenancy` on arbitrary dates
pub fn ledger_entries_strategy(tenancy: Tenancy, max: usize) -> impl Strategy<Value = Vec<PaymentLedgerEntry>> {
    prop::collection::vec(date_strategy(), 0..=max).prop_map(move |dates| {
        dates
            .into_iter()
            .map(|date| PaymentEntryBuilder::for_tenancy(&tenancy, date).build())
            .collect()
    })
}
