//! Quotation tax engine
//!
//! Turns a list of line items into document totals. Every call is a full
//! recomputation over all lines, so calling it twice on the same list gives
//! identical results.
//!
//! Each line's tax is split evenly into SGST and CGST. SGST takes half the tax
//! rounded to internal precision and CGST takes the remainder, so the two
//! components always add back to the line tax exactly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::money::INTERNAL_DECIMAL_PLACES;
use core_kernel::{round_half_up, Currency, LineItemId, Money, Rate};

use crate::line_item::QuotationLineItem;

/// Tax breakdown for one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTax {
    pub line_id: LineItemId,
    pub amount: Money,
    pub tax_rate_percent: Decimal,
    pub tax: Money,
    pub sgst: Money,
    pub cgst: Money,
}

impl LineTax {
    /// Line amount plus its tax
    pub fn gross(&self) -> Money {
        Money::new(self.amount.amount() + self.tax.amount(), self.amount.currency())
    }
}

/// The four persisted document totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsSnapshot {
    pub subtotal: Money,
    pub sgst_amount: Money,
    pub cgst_amount: Money,
    pub total: Money,
}

impl TotalsSnapshot {
    pub fn zero(currency: Currency) -> Self {
        Self {
            subtotal: Money::zero(currency),
            sgst_amount: Money::zero(currency),
            cgst_amount: Money::zero(currency),
            total: Money::zero(currency),
        }
    }

    pub fn tax_total(&self) -> Money {
        Money::new(
            self.sgst_amount.amount() + self.cgst_amount.amount(),
            self.total.currency(),
        )
    }
}

/// Per-line breakdown plus aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationTotals {
    pub lines: Vec<LineTax>,
    pub subtotal: Money,
    pub sgst_amount: Money,
    pub cgst_amount: Money,
    pub total: Money,
}

impl QuotationTotals {
    pub fn empty(currency: Currency) -> Self {
        TaxEngine::compute(&[], currency)
    }

    pub fn currency(&self) -> Currency {
        self.total.currency()
    }

    pub fn tax_total(&self) -> Money {
        self.snapshot().tax_total()
    }

    pub fn snapshot(&self) -> TotalsSnapshot {
        TotalsSnapshot {
            subtotal: self.subtotal,
            sgst_amount: self.sgst_amount,
            cgst_amount: self.cgst_amount,
            total: self.total,
        }
    }

    /// True when the aggregates equal a persisted snapshot
    pub fn matches(&self, snapshot: &TotalsSnapshot) -> bool {
        self.snapshot() == *snapshot
    }

    pub fn line(&self, id: LineItemId) -> Option<&LineTax> {
        self.lines.iter().find(|line| line.line_id == id)
    }
}

/// Pure tax computation over line items
pub struct TaxEngine;

impl TaxEngine {
    pub fn line_tax(item: &QuotationLineItem, currency: Currency) -> LineTax {
        let amount = Money::new(item.amount(), currency);
        let tax = Rate::from_percentage(item.tax_rate_percent()).apply(&amount);
        let sgst = Money::new(
            round_half_up(tax.amount() / dec!(2), INTERNAL_DECIMAL_PLACES),
            currency,
        );
        let cgst = Money::new(tax.amount() - sgst.amount(), currency);

        LineTax {
            line_id: item.id,
            amount,
            tax_rate_percent: item.tax_rate_percent(),
            tax,
            sgst,
            cgst,
        }
    }

    pub fn compute(items: &[QuotationLineItem], currency: Currency) -> QuotationTotals {
        let lines: Vec<LineTax> = items
            .iter()
            .map(|item| Self::line_tax(item, currency))
            .collect();

        let subtotal: Decimal = lines.iter().map(|l| l.amount.amount()).sum();
        let sgst: Decimal = lines.iter().map(|l| l.sgst.amount()).sum();
        let cgst: Decimal = lines.iter().map(|l| l.cgst.amount()).sum();

        QuotationTotals {
            lines,
            subtotal: Money::new(subtotal, currency),
            sgst_amount: Money::new(sgst, currency),
            cgst_amount: Money::new(cgst, currency),
            total: Money::new(subtotal + sgst + cgst, currency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::QuotationId;

    fn line(qty: Decimal, rate: Decimal, tax: Decimal) -> QuotationLineItem {
        QuotationLineItem::new(QuotationId::new(), "item", qty, rate, tax).unwrap()
    }

    #[test]
    fn test_mixed_rate_scenario() {
        let items = vec![line(dec!(2), dec!(500), dec!(18)), line(dec!(1), dec!(1000), dec!(12))];
        let totals = TaxEngine::compute(&items, Currency::INR);

        assert_eq!(totals.subtotal.amount(), dec!(2000));
        assert_eq!(totals.lines[0].tax.amount(), dec!(180));
        assert_eq!(totals.lines[1].tax.amount(), dec!(120));
        assert_eq!(totals.sgst_amount.amount(), dec!(150));
        assert_eq!(totals.cgst_amount.amount(), dec!(150));
        assert_eq!(totals.total.amount(), dec!(2300));
    }

    #[test]
    fn test_odd_tax_splits_without_loss() {
        let items = vec![line(dec!(1), dec!(0.0015), dec!(18))];
        let totals = TaxEngine::compute(&items, Currency::INR);
        let l = &totals.lines[0];
        assert_eq!(l.sgst.amount() + l.cgst.amount(), l.tax.amount());
    }

    #[test]
    fn test_empty_list_is_all_zero() {
        let totals = QuotationTotals::empty(Currency::INR);
        assert!(totals.lines.is_empty());
        assert!(totals.total.is_zero());
        assert!(totals.matches(&TotalsSnapshot::zero(Currency::INR)));
    }

    #[test]
    fn test_zero_rate_line_has_no_tax() {
        let totals = TaxEngine::compute(&[line(dec!(3), dec!(100), dec!(0))], Currency::INR);
        assert!(totals.tax_total().is_zero());
        assert_eq!(totals.total.amount(), dec!(300));
    }
}
