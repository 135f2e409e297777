//! Rendering quotations and rent statements through the public API

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;

use core_kernel::{BillingMonth, Currency, Money, NumberLocale, PaymentEntryId, PropertyId, QuotationId};
use domain_documents::{
    Block, ClientDetails, DocumentKind, DocumentLayout, DocumentSink, IssuerDetails, LeaseStatementInput,
    LeaseStatementRenderer, PageBudget, QuotationRenderInput, QuotationRenderer, RenderError,
    TaxLayout, TextSink,
};
use domain_quotation::{QuotationDocument, QuotationLineItem, TaxEngine};
use domain_tenancy::{NewPaymentEntry, PaymentLedgerEntry, Tenancy};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn issuer() -> IssuerDetails {
    IssuerDetails {
        phone: Some("+91 80 1234 5678".into()),
        ..IssuerDetails::new("Acme Realty")
    }
}

fn quoted(items: &[QuotationLineItem]) -> QuotationDocument {
    let mut doc = QuotationDocument::new(Currency::INR, date(2025, 4, 1));
    doc.quotation_number = Some("QT-00007".into());
    doc.apply_totals(&TaxEngine::compute(items, Currency::INR));
    doc
}

fn scenario_items(quotation_id: QuotationId) -> Vec<QuotationLineItem> {
    vec![
        QuotationLineItem::new(quotation_id, "Tiles", dec!(2), dec!(500), dec!(18))
            .unwrap()
            .with_order(0),
        QuotationLineItem::new(quotation_id, "Labour", dec!(1), dec!(1000), dec!(12))
            .unwrap()
            .with_order(1),
    ]
}

mod quotation_tests {
    use super::*;

    fn render(
        layout: TaxLayout,
        doc: &QuotationDocument,
        items: &[QuotationLineItem],
    ) -> Result<DocumentLayout, RenderError> {
        let client = ClientDetails::new("Ravi Kumar");
        let issuer = issuer();
        QuotationRenderer::new(layout, PageBudget::default(), NumberLocale::en_in()).render(
            &QuotationRenderInput {
                document: doc,
                items,
                client: &client,
                issuer: &issuer,
            },
        )
    }

    #[test]
    fn test_itemized_layout_prints_split_tax() {
        let items = scenario_items(QuotationId::new());
        let doc = quoted(&items);

        let layout = render(TaxLayout::Itemized, &doc, &items).unwrap();

        assert_eq!(layout.kind, DocumentKind::Quotation);
        assert_eq!(layout.file_stem, "quotation-qt-00007");
        assert_eq!(layout.page_count(), 1);

        let rows: Vec<&Vec<String>> = layout.table_rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "Tiles");
        assert_eq!(rows[0][2], "2");
        assert_eq!(rows[0][4], "₹90.00 (9%)");
        assert_eq!(rows[0][5], "₹90.00 (9%)");
        assert_eq!(rows[0][6], "₹1,000.00");
        assert_eq!(rows[1][4], "₹60.00 (6%)");

        let totals = layout.totals().unwrap();
        assert_eq!(
            totals.rows,
            vec![
                ("Subtotal".to_string(), "₹2,000.00".to_string()),
                ("SGST".to_string(), "₹150.00".to_string()),
                ("CGST".to_string(), "₹150.00".to_string()),
            ]
        );
        assert_eq!(totals.grand_total.1, "₹2,300.00");
    }

    #[test]
    fn test_consolidated_layout_prints_one_tax_figure() {
        let items = scenario_items(QuotationId::new());
        let doc = quoted(&items);

        let layout = render(TaxLayout::Consolidated, &doc, &items).unwrap();

        let rows: Vec<&Vec<String>> = layout.table_rows().collect();
        assert_eq!(rows[0].len(), 6);
        assert_eq!(rows[0][4], "₹180.00 (18%)");
        let totals = layout.totals().unwrap();
        assert_eq!(totals.rows[1], ("GST".to_string(), "₹300.00".to_string()));
        assert_eq!(totals.grand_total.1, "₹2,300.00");
    }

    #[test]
    fn test_stale_snapshot_is_refused() {
        let items = scenario_items(QuotationId::new());
        let mut doc = quoted(&items);
        doc.totals.total = Money::new(dec!(2299), Currency::INR);

        let err = render(TaxLayout::Itemized, &doc, &items).unwrap_err();
        match err {
            RenderError::TotalsMismatch { document, stored, recomputed } => {
                assert_eq!(document, "QT-00007");
                assert_eq!(stored, "₹2,299.00");
                assert_eq!(recomputed, "₹2,300.00");
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_long_quotation_spans_pages() {
        let quotation_id = QuotationId::new();
        let items: Vec<QuotationLineItem> = (0..40u32)
            .map(|i| {
                QuotationLineItem::new(quotation_id, format!("Item {}", i + 1), dec!(1), dec!(100), dec!(18))
                    .unwrap()
                    .with_order(i)
            })
            .collect();
        let doc = quoted(&items);

        let layout = render(TaxLayout::Itemized, &doc, &items).unwrap();

        assert!(layout.page_count() >= 2);
        let rows: Vec<&Vec<String>> = layout.table_rows().collect();
        assert_eq!(rows.len(), 40);
        assert_eq!(rows[0][0], "1");
        assert_eq!(rows[39][0], "40");

        let continued = layout.pages[1].blocks.iter().any(|block| matches!(block, Block::Table(t) if t.continued));
        assert!(continued);
        assert_eq!(layout.totals().unwrap().grand_total.1, "₹4,720.00");
    }

    #[test]
    fn test_long_notes_break_across_pages() {
        let items = scenario_items(QuotationId::new());
        let mut doc = quoted(&items);
        let clauses: Vec<String> = (1..=100).map(|i| format!("Clause {}: materials to be approved on site", i)).collect();
        doc.notes = Some(clauses.join("\n"));

        let layout = render(TaxLayout::Itemized, &doc, &items).unwrap();

        let budget = PageBudget::default();
        let rows_per_page = (budget.page_height / budget.row_height) as usize;
        let mut printed = Vec::new();
        for page in &layout.pages {
            let on_page: Vec<&String> = page
                .blocks
                .iter()
                .filter_map(|block| match block {
                    Block::Text(t) => Some(t.lines.iter()),
                    _ => None,
                })
                .flatten()
                .collect();
            assert!(on_page.len() <= rows_per_page, "page {} overflows", page.number);
            printed.extend(on_page.into_iter().cloned());
        }
        assert!(layout.page_count() >= 3);
        assert_eq!(printed, clauses);
        assert_eq!(layout.totals().unwrap().grand_total.1, "₹2,300.00");
    }

    #[test]
    fn test_text_export_of_quotation() {
        let items = scenario_items(QuotationId::new());
        let doc = quoted(&items);
        let layout = render(TaxLayout::Itemized, &doc, &items).unwrap();

        let exported = TextSink::default().export(&layout).unwrap();
        assert_eq!(exported.file_name, "quotation-qt-00007.txt");
        let text = String::from_utf8(exported.bytes).unwrap();
        assert!(text.starts_with("ACME REALTY\n"));
        assert!(text.contains("Quotation No: QT-00007"));
        assert!(text.contains("Total: ₹2,300.00"));
    }
}

mod statement_tests {
    use super::*;

    fn tenancy() -> Tenancy {
        Tenancy::new(
            PropertyId::new(),
            None,
            date(2025, 1, 1),
            date(2025, 6, 30),
            Money::new(dec!(25000), Currency::INR),
            5,
        )
        .unwrap()
    }

    fn paid(tenancy: &Tenancy, on: NaiveDate) -> PaymentLedgerEntry {
        NewPaymentEntry::new(tenancy.id, tenancy.rental_amount, on)
            .with_reference("UTR123")
            .into_entry(PaymentEntryId::new(), Utc::now())
    }

    #[test]
    fn test_statement_marks_paid_unpaid_and_upcoming_months() {
        let tenancy = tenancy();
        let entries = vec![paid(&tenancy, date(2025, 3, 4)), paid(&tenancy, date(2025, 1, 5))];
        let tenant = ClientDetails::new("Meera Shah");
        let issuer = issuer();

        let layout = LeaseStatementRenderer::new(PageBudget::default(), NumberLocale::en_in())
            .render(&LeaseStatementInput {
                tenancy: &tenancy,
                entries: &entries,
                tenant: &tenant,
                property_label: "Flat 4B",
                issuer: &issuer,
                as_of: BillingMonth::new(2025, 4).unwrap(),
            })
            .unwrap();

        assert_eq!(layout.kind, DocumentKind::LeaseStatement);
        assert_eq!(layout.file_stem, "rent-statement-flat-4b-2025-04");

        let rows: Vec<&Vec<String>> = layout.table_rows().collect();
        // Two payments, oldest first, then six lease months.
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0][0], "05-01-2025");
        assert_eq!(rows[1][0], "04-03-2025");

        let statuses: Vec<&str> = rows[2..].iter().map(|r| r[2].as_str()).collect();
        assert_eq!(statuses, vec!["Paid", "Unpaid", "Paid", "Unpaid", "Upcoming", "Upcoming"]);
        assert_eq!(rows[2][1], "05-01-2025");

        let totals = layout.totals().unwrap();
        assert_eq!(totals.grand_total.1, "₹50,000.00");
        assert!(totals.rows.contains(&("Unpaid to date".to_string(), "2".to_string())));
    }

    #[test]
    fn test_statement_ignores_other_tenancies() {
        let tenancy = tenancy();
        let other = self::tenancy();
        let entries = vec![paid(&other, date(2025, 2, 1))];
        let tenant = ClientDetails::new("Meera Shah");
        let issuer = issuer();

        let layout = LeaseStatementRenderer::new(PageBudget::default(), NumberLocale::en_in())
            .render(&LeaseStatementInput {
                tenancy: &tenancy,
                entries: &entries,
                tenant: &tenant,
                property_label: "Flat 4B",
                issuer: &issuer,
                as_of: BillingMonth::new(2025, 2).unwrap(),
            })
            .unwrap();

        assert_eq!(layout.totals().unwrap().grand_total.1, "₹0.00");
        assert_eq!(layout.table_rows().count(), 6);
    }
}

mod pagination_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_every_line_printed_once_in_order(lines in 1u32..80, rows_per_page in 1u32..30) {
            let quotation_id = QuotationId::new();
            let items: Vec<QuotationLineItem> = (0..lines)
                .map(|i| {
                    QuotationLineItem::new(quotation_id, format!("Item {}", i + 1), dec!(1), dec!(250), dec!(5))
                        .unwrap()
                        .with_order(i)
                })
                .collect();
            let doc = quoted(&items);
            let client = ClientDetails::new("Ravi Kumar");
            let issuer = issuer();
            let renderer = QuotationRenderer::new(
                TaxLayout::Consolidated,
                PageBudget::with_rows_per_page(rows_per_page),
                NumberLocale::en_in(),
            );

            let layout = renderer
                .render(&QuotationRenderInput { document: &doc, items: &items, client: &client, issuer: &issuer })
                .unwrap();

            let serials: Vec<String> = layout.table_rows().map(|row| row[0].clone()).collect();
            let expected: Vec<String> = (1..=lines).map(|n| n.to_string()).collect();
            prop_assert_eq!(serials, expected);

            let last = layout.pages.last().unwrap();
            prop_assert!(last.blocks.iter().any(|block| matches!(block, Block::Totals(_))));
        }
    }
}
