//! Tax engine and draft editing behaviour through the public API

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, QuotationId};
use domain_quotation::{
    QuotationDocument, QuotationDraft, QuotationLineItem, TaxEngine, DEFAULT_TAX_RATE_PERCENT,
};

fn draft() -> QuotationDraft {
    let doc = QuotationDocument::new(Currency::INR, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
    QuotationDraft::new(doc, DEFAULT_TAX_RATE_PERCENT).unwrap()
}

mod scenario_tests {
    use super::*;

    #[test]
    fn test_two_rate_quotation_totals() {
        let id = QuotationId::new();
        let items = vec![
            QuotationLineItem::new(id, "Tiles", dec!(2), dec!(500), dec!(18)).unwrap(),
            QuotationLineItem::new(id, "Labour", dec!(1), dec!(1000), dec!(12)).unwrap(),
        ];

        let totals = TaxEngine::compute(&items, Currency::INR);

        assert_eq!(totals.subtotal.amount(), dec!(2000));
        assert_eq!(totals.sgst_amount.amount(), dec!(150));
        assert_eq!(totals.cgst_amount.amount(), dec!(150));
        assert_eq!(totals.total.amount(), dec!(2300));
        assert_eq!(totals.total.to_string(), "₹2300.00");
    }

    #[test]
    fn test_added_line_uses_configured_rate() {
        let doc = QuotationDocument::new(Currency::INR, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        let mut draft = QuotationDraft::new(doc, dec!(5)).unwrap();
        let id = draft.add_line().unwrap();
        let line = draft.line(id).unwrap();
        assert_eq!(line.tax_rate_percent(), dec!(5));
        assert_eq!(line.quantity(), Decimal::ONE);
        assert_eq!(line.amount(), Decimal::ZERO);
    }
}

#[derive(Debug, Clone)]
enum Edit {
    Quantity(u32),
    Rate(u32),
    TaxRate(u32),
    Add,
    RemoveFirst,
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0u32..500).prop_map(Edit::Quantity),
        (0u32..100_000).prop_map(Edit::Rate),
        (0u32..=100).prop_map(Edit::TaxRate),
        Just(Edit::Add),
        Just(Edit::RemoveFirst),
    ]
}

proptest! {
    #[test]
    fn amount_tracks_quantity_and_rate_across_edits(edits in prop::collection::vec(arb_edit(), 1..40)) {
        let mut draft = draft();
        for edit in edits {
            let target = draft.lines()[draft.lines().len() - 1].id;
            match edit {
                Edit::Quantity(q) => draft.set_quantity(target, Decimal::from(q)).unwrap(),
                Edit::Rate(r) => draft.set_rate(target, Decimal::from(r)).unwrap(),
                Edit::TaxRate(t) => {
                    let before = draft.line(target).unwrap().amount();
                    draft.set_tax_rate(target, Decimal::from(t)).unwrap();
                    prop_assert_eq!(draft.line(target).unwrap().amount(), before);
                }
                Edit::Add => {
                    draft.add_line().unwrap();
                }
                Edit::RemoveFirst => {
                    let first = draft.lines()[0].id;
                    draft.remove_line(first);
                }
            }

            prop_assert!(!draft.lines().is_empty());
            for line in draft.lines() {
                prop_assert_eq!(line.amount(), line.quantity() * line.rate());
            }
            let fresh = TaxEngine::compute(draft.lines(), Currency::INR);
            prop_assert_eq!(draft.totals(), &fresh);
        }
    }
}
