//! Rent statement rendering for one tenancy

use rust_decimal::Decimal;
use tracing::debug;

use core_kernel::{format_money, BillingMonth, Money, NumberLocale};
use domain_tenancy::{entries_in_month, is_paid, LeaseSummary, PaymentLedgerEntry, Tenancy};

use crate::details::{file_stem, ClientDetails, IssuerDetails};
use crate::error::RenderError;
use crate::layout::{
    Block, Column, DocumentKind, DocumentLayout, IssuerBlock, PageBudget, Paginator, PartyBlock,
    TitleBlock, TotalsBlock,
};
use crate::quotation::DATE_FORMAT;

/// Everything printed on a rent statement
#[derive(Debug, Clone, Copy)]
pub struct LeaseStatementInput<'a> {
    pub tenancy: &'a Tenancy,
    pub entries: &'a [PaymentLedgerEntry],
    pub tenant: &'a ClientDetails,
    /// Property or unit name shown on the statement
    pub property_label: &'a str,
    pub issuer: &'a IssuerDetails,
    /// Months after this one are shown as upcoming rather than unpaid
    pub as_of: BillingMonth,
}

#[derive(Debug, Clone)]
pub struct LeaseStatementRenderer {
    budget: PageBudget,
    locale: NumberLocale,
}

impl LeaseStatementRenderer {
    pub fn new(budget: PageBudget, locale: NumberLocale) -> Self {
        Self { budget, locale }
    }

    pub fn render(&self, input: &LeaseStatementInput<'_>) -> Result<DocumentLayout, RenderError> {
        let tenancy = input.tenancy;
        let mut entries: Vec<PaymentLedgerEntry> = input
            .entries
            .iter()
            .filter(|entry| entry.tenancy_id == tenancy.id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.payment_date, entry.created_at));
        let summary = LeaseSummary::compute(tenancy, &entries, input.as_of);

        let mut paginator = Paginator::new(self.budget)?;
        let budget = *paginator.budget();

        paginator.place(
            Block::Issuer(IssuerBlock {
                name: input.issuer.name.clone(),
                lines: input.issuer.contact_lines(),
            }),
            budget.header_height,
        );
        paginator.place(
            Block::Title(TitleBlock {
                title: "Rent Statement".to_string(),
                fields: vec![
                    ("Property".to_string(), input.property_label.to_string()),
                    ("Statement Month".to_string(), input.as_of.to_string()),
                    (
                        "Lease".to_string(),
                        format!(
                            "{} to {}",
                            tenancy.lease_start_date.format(DATE_FORMAT),
                            tenancy.lease_end_date.format(DATE_FORMAT)
                        ),
                    ),
                ],
            }),
            budget.title_height,
        );
        paginator.place(
            Block::BillTo(PartyBlock {
                heading: "Tenant".to_string(),
                name: input.tenant.name.clone(),
                lines: input.tenant.lines(),
            }),
            budget.bill_to_height,
        );

        let terms = vec![
            format!("Monthly rent: {}", format_money(&tenancy.rental_amount, &self.locale)),
            format!("Rent due on day {} of each month", tenancy.rent_due_day),
            format!("Lease status: {}", tenancy.lease_status),
        ];
        paginator.place_text(terms);

        let payment_rows: Vec<Vec<String>> = entries
            .iter()
            .map(|entry| {
                vec![
                    entry.payment_date.format(DATE_FORMAT).to_string(),
                    entry.payment_method.clone().unwrap_or_default(),
                    entry.reference_number.clone().unwrap_or_default(),
                    format_money(&entry.amount, &self.locale),
                ]
            })
            .collect();
        paginator.place_table(
            Some("Payments".to_string()),
            vec![
                Column::left("Date"),
                Column::left("Method"),
                Column::left("Reference"),
                Column::right("Amount"),
            ],
            payment_rows,
        );

        let month_rows: Vec<Vec<String>> = tenancy
            .first_month()
            .through(tenancy.last_month())
            .map(|month| {
                let received: Decimal = entries_in_month(&entries, month)
                    .map(|entry| entry.amount.amount())
                    .sum();
                let status = if is_paid(&entries, month) {
                    "Paid"
                } else if month <= input.as_of {
                    "Unpaid"
                } else {
                    "Upcoming"
                };
                vec![
                    month.to_string(),
                    tenancy.due_date_in(month).format(DATE_FORMAT).to_string(),
                    status.to_string(),
                    format_money(&Money::new(received, tenancy.rental_amount.currency()), &self.locale),
                ]
            })
            .collect();
        paginator.place_table(
            Some("Monthly Status".to_string()),
            vec![
                Column::left("Month"),
                Column::left("Due Date"),
                Column::left("Status"),
                Column::right("Received"),
            ],
            month_rows,
        );

        paginator.place(
            Block::Totals(TotalsBlock {
                rows: vec![
                    ("Months in lease".to_string(), summary.months_in_lease.to_string()),
                    ("Months paid".to_string(), summary.months_paid.to_string()),
                    ("Unpaid to date".to_string(), summary.unpaid_months.len().to_string()),
                    ("Payments recorded".to_string(), summary.payments_count.to_string()),
                ],
                grand_total: (
                    "Total received".to_string(),
                    format_money(&summary.total_received, &self.locale),
                ),
            }),
            budget.totals_height,
        );

        let pages = paginator.finish();
        debug!(tenancy_id = %tenancy.id, pages = pages.len(), "Rent statement rendered");

        Ok(DocumentLayout {
            kind: DocumentKind::LeaseStatement,
            title: format!("Rent Statement {}", input.property_label),
            file_stem: file_stem(&["rent-statement", input.property_label, &input.as_of.to_string()]),
            pages,
        })
    }
}
