//! Quotation rendering
//!
//! One rendering routine covers both printed styles; `TaxLayout` only decides
//! which tax columns and total rows appear. Every number comes from
//! `TaxEngine::compute`, and a document whose stored snapshot disagrees with
//! a fresh computation is refused.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use core_kernel::{format_decimal, format_money, format_percent, Money, NumberLocale};
use domain_quotation::{LineTax, QuotationDocument, QuotationLineItem, QuotationTotals, TaxEngine};

use crate::details::{file_stem, ClientDetails, IssuerDetails};
use crate::error::RenderError;
use crate::layout::{
    Block, Column, DocumentKind, DocumentLayout, IssuerBlock, PageBudget, Paginator, PartyBlock,
    TitleBlock, TotalsBlock,
};

pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Which tax columns a quotation prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxLayout {
    /// SGST and CGST columns on every line
    #[default]
    Itemized,
    /// One tax column per line and one tax row in the totals
    Consolidated,
}

impl TaxLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxLayout::Itemized => "itemized",
            TaxLayout::Consolidated => "consolidated",
        }
    }

    fn columns(&self) -> Vec<Column> {
        let mut columns = vec![
            Column::right("#"),
            Column::left("Description"),
            Column::right("Qty"),
            Column::right("Rate"),
        ];
        match self {
            TaxLayout::Itemized => {
                columns.push(Column::right("SGST"));
                columns.push(Column::right("CGST"));
            }
            TaxLayout::Consolidated => columns.push(Column::right("Tax")),
        }
        columns.push(Column::right("Amount"));
        columns
    }

    fn tax_cells(&self, line: &LineTax, locale: &NumberLocale) -> Vec<String> {
        match self {
            TaxLayout::Itemized => {
                let half_rate = format_percent(line.tax_rate_percent / Decimal::from(2));
                vec![
                    format!("{} ({})", format_money(&line.sgst, locale), half_rate),
                    format!("{} ({})", format_money(&line.cgst, locale), half_rate),
                ]
            }
            TaxLayout::Consolidated => vec![format!(
                "{} ({})",
                format_money(&line.tax, locale),
                format_percent(line.tax_rate_percent)
            )],
        }
    }

    fn total_rows(&self, totals: &QuotationTotals, locale: &NumberLocale) -> Vec<(String, String)> {
        let mut rows = vec![("Subtotal".to_string(), format_money(&totals.subtotal, locale))];
        match self {
            TaxLayout::Itemized => {
                rows.push(("SGST".to_string(), format_money(&totals.sgst_amount, locale)));
                rows.push(("CGST".to_string(), format_money(&totals.cgst_amount, locale)));
            }
            TaxLayout::Consolidated => {
                rows.push(("GST".to_string(), format_money(&totals.tax_total(), locale)));
            }
        }
        rows
    }
}

impl fmt::Display for TaxLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxLayout {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "itemized" => Ok(TaxLayout::Itemized),
            "consolidated" => Ok(TaxLayout::Consolidated),
            other => Err(RenderError::UnknownTaxLayout(other.to_string())),
        }
    }
}

/// Everything printed on a quotation
#[derive(Debug, Clone, Copy)]
pub struct QuotationRenderInput<'a> {
    pub document: &'a QuotationDocument,
    pub items: &'a [QuotationLineItem],
    pub client: &'a ClientDetails,
    pub issuer: &'a IssuerDetails,
}

#[derive(Debug, Clone)]
pub struct QuotationRenderer {
    tax_layout: TaxLayout,
    budget: PageBudget,
    locale: NumberLocale,
}

pub(crate) fn format_quantity(quantity: Decimal, locale: &NumberLocale) -> String {
    let normalized = quantity.normalize();
    format_decimal(normalized, normalized.scale(), locale)
}

impl QuotationRenderer {
    pub fn new(tax_layout: TaxLayout, budget: PageBudget, locale: NumberLocale) -> Self {
        Self {
            tax_layout,
            budget,
            locale,
        }
    }

    pub fn tax_layout(&self) -> TaxLayout {
        self.tax_layout
    }

    pub fn render(&self, input: &QuotationRenderInput<'_>) -> Result<DocumentLayout, RenderError> {
        let document = input.document;
        let mut items = input.items.to_vec();
        items.sort_by_key(|item| item.display_order);

        let totals = TaxEngine::compute(&items, document.currency);
        if !totals.matches(&document.totals) {
            warn!(
                quotation_id = %document.id,
                stored = %document.totals.total,
                recomputed = %totals.total,
                "Refusing to render inconsistent totals"
            );
            return Err(RenderError::TotalsMismatch {
                document: document.display_number().to_string(),
                stored: format_money(&document.totals.total, &self.locale),
                recomputed: format_money(&totals.total, &self.locale),
            });
        }

        let mut paginator = Paginator::new(self.budget)?;
        let budget = *paginator.budget();

        paginator.place(
            Block::Issuer(IssuerBlock {
                name: input.issuer.name.clone(),
                lines: input.issuer.contact_lines(),
            }),
            budget.header_height,
        );

        let mut fields = vec![
            ("Quotation No".to_string(), document.display_number().to_string()),
            ("Date".to_string(), document.quotation_date.format(DATE_FORMAT).to_string()),
        ];
        if let Some(valid_until) = document.valid_until {
            fields.push(("Valid Until".to_string(), valid_until.format(DATE_FORMAT).to_string()));
        }
        paginator.place(
            Block::Title(TitleBlock {
                title: "Quotation".to_string(),
                fields,
            }),
            budget.title_height,
        );

        paginator.place(
            Block::BillTo(PartyBlock {
                heading: "Bill To".to_string(),
                name: input.client.name.clone(),
                lines: input.client.lines(),
            }),
            budget.bill_to_height,
        );

        let rows: Vec<Vec<String>> = items
            .iter()
            .zip(totals.lines.iter())
            .enumerate()
            .map(|(index, (item, line))| {
                let mut row = vec![
                    (index + 1).to_string(),
                    item.description().to_string(),
                    format_quantity(item.quantity(), &self.locale),
                    format_money(&Money::new(item.rate(), document.currency), &self.locale),
                ];
                row.extend(self.tax_layout.tax_cells(line, &self.locale));
                row.push(format_money(&line.amount, &self.locale));
                row
            })
            .collect();
        paginator.place_table(None, self.tax_layout.columns(), rows);

        paginator.place(
            Block::Totals(TotalsBlock {
                rows: self.tax_layout.total_rows(&totals, &self.locale),
                grand_total: ("Total".to_string(), format_money(&totals.total, &self.locale)),
            }),
            budget.totals_height,
        );

        if let Some(ref notes) = document.notes {
            paginator.place_text(notes.lines().map(str::to_string).collect());
        }

        let pages = paginator.finish();
        debug!(quotation_id = %document.id, pages = pages.len(), layout = %self.tax_layout, "Quotation rendered");

        Ok(DocumentLayout {
            kind: DocumentKind::Quotation,
            title: format!("Quotation {}", document.display_number()),
            file_stem: file_stem(&["quotation", document.display_number()]),
            pages,
        })
    }
}
