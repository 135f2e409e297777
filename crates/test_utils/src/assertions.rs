//! Custom Test Assertions
//!
//! Assertion helpers for money, quotation totals and rendered layouts that
//! print the values involved when they fail.

use core_kernel::{Currency, Money};
use domain_documents::{Block, DocumentLayout};
use domain_quotation::{QuotationLineItem, QuotationTotals};
use domain_tenancy::Tenancy;
use rust_decimal::Decimal;

/// Asserts that a Money value has the expected amount and currency
pub fn assert_money_eq(actual: &Money, expected: Decimal, currency: Currency) {
    assert_eq!(
        actual.currency(),
        currency,
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        currency
    );
    assert_eq!(
        actual.amount(),
        expected,
        "Amount mismatch: actual={}, expected={}",
        actual.amount(),
        expected
    );
}

pub fn assert_inr(actual: &Money, expected: Decimal) {
    assert_money_eq(actual, expected, Currency::INR);
}

/// Asserts the aggregate invariants of a totals result
///
/// * every line's SGST and CGST add up to its tax exactly
/// * the aggregates are the plain sums of the lines
/// * `total == subtotal + sgst + cgst`
pub fn assert_totals_consistent(totals: &QuotationTotals) {
    let mut subtotal = Decimal::ZERO;
    let mut sgst = Decimal::ZERO;
    let mut cgst = Decimal::ZERO;
    for line in &totals.lines {
        assert_eq!(
            line.sgst.amount() + line.cgst.amount(),
            line.tax.amount(),
            "Split does not sum to the line tax for {}: sgst={}, cgst={}, tax={}",
            line.line_id,
            line.sgst.amount(),
            line.cgst.amount(),
            line.tax.amount()
        );
        subtotal += line.amount.amount();
        sgst += line.sgst.amount();
        cgst += line.cgst.amount();
    }
    assert_eq!(totals.subtotal.amount(), subtotal, "Subtotal is not the sum of line amounts");
    assert_eq!(totals.sgst_amount.amount(), sgst, "SGST is not the sum of line SGST");
    assert_eq!(totals.cgst_amount.amount(), cgst, "CGST is not the sum of line CGST");
    assert_eq!(
        totals.total.amount(),
        subtotal + sgst + cgst,
        "Total {} is not subtotal {} + SGST {} + CGST {}",
        totals.total.amount(),
        subtotal,
        sgst,
        cgst
    );
}

/// Asserts that the combined split equals the sum of `amount x rate / 100`
pub fn assert_split_matches_items(totals: &QuotationTotals, items: &[QuotationLineItem]) {
    let expected: Decimal = items
        .iter()
        .map(|item| item.amount() * item.tax_rate_percent() / Decimal::ONE_HUNDRED)
        .sum();
    let actual = totals.sgst_amount.amount() + totals.cgst_amount.amount();
    let tolerance = Decimal::new(1, 4) * Decimal::from(items.len().max(1) as u64);
    assert!(
        (actual - expected).abs() <= tolerance,
        "SGST + CGST = {} but the line taxes sum to {}",
        actual,
        expected
    );
}

/// Asserts that every line amount is quantity times rate
pub fn assert_amounts_derived(items: &[QuotationLineItem]) {
    for item in items {
        assert_eq!(
            item.amount(),
            item.quantity() * item.rate(),
            "Line {} amount {} is not {} x {}",
            item.id,
            item.amount(),
            item.quantity(),
            item.rate()
        );
    }
}

/// Asserts that the cached status fields of two tenancies agree
pub fn assert_status_unchanged(before: &Tenancy, after: &Tenancy) {
    assert_eq!(before.payment_status, after.payment_status, "payment_status changed");
    assert_eq!(before.last_payment_date, after.last_payment_date, "last_payment_date changed");
    assert_eq!(before.next_payment_date, after.next_payment_date, "next_payment_date changed");
}

/// All text of a layout, one cell or line per entry
pub fn layout_text(layout: &DocumentLayout) -> Vec<String> {
    let mut text = Vec::new();
    for page in &layout.pages {
        for block in &page.blocks {
            match block {
                Block::Issuer(issuer) => {
                    text.push(issuer.name.clone());
                    text.extend(issuer.lines.iter().cloned());
                }
                Block::Title(title) => {
                    text.push(title.title.clone());
                    for (label, value) in &title.fields {
                        text.push(label.clone());
                        text.push(value.clone());
                    }
                }
                Block::BillTo(party) => {
                    text.push(party.heading.clone());
                    text.push(party.name.clone());
                    text.extend(party.lines.iter().cloned());
                }
                Block::Table(table) => {
                    text.extend(table.columns.iter().map(|c| c.heading.clone()));
                    text.extend(table.rows.iter().flatten().cloned());
                }
                Block::Totals(totals) => {
                    for (label, value) in &totals.rows {
                        text.push(label.clone());
                        text.push(value.clone());
                    }
                    text.push(totals.grand_total.0.clone());
                    text.push(totals.grand_total.1.clone());
                }
                Block::Text(block) => text.extend(block.lines.iter().cloned()),
            }
        }
    }
    text
}

/// Asserts that some cell or line of the layout contains `needle`
pub fn assert_layout_contains(layout: &DocumentLayout, needle: &str) {
    let text = layout_text(layout);
    assert!(
        text.iter().any(|t| t.contains(needle)),
        "Layout '{}' does not contain '{}'; text: {:?}",
        layout.title,
        needle,
        text
    );
}
