//! PostgreSQL quotation store
//!
//! Documents live in `quotations` with their totals snapshot; line items in
//! `quotation_line_items`. A save upserts the document and replaces every
//! line item inside one transaction. Quotation numbers come from the
//! `quotation_number_seq` sequence, so a number drawn for a save that later
//! fails is not reused.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    ClientId, Currency, DomainPort, LineItemId, Money, OperationMetadata, PortError, QuotationId,
};
use domain_quotation::{
    format_quotation_number, QuotationDocument, QuotationLineItem, QuotationNumberSequence,
    QuotationPort, QuotationQuery, QuotationStatus, TotalsSnapshot, QUOTATION_NUMBER_PREFIX,
};

use crate::error::DatabaseError;

const QUOTATION_COLUMNS: &str = "quotation_id, quotation_number, client_id, status, quotation_date, \
    valid_until, currency, subtotal, sgst_amount, cgst_amount, total_amount, notes, created_at, updated_at";

const LINE_ITEM_COLUMNS: &str = "line_item_id, quotation_id, description, quantity, rate, \
    tax_rate_percent, display_order, notes";

#[derive(Debug, Clone, FromRow)]
pub struct QuotationRow {
    pub quotation_id: Uuid,
    pub quotation_number: Option<String>,
    pub client_id: Option<Uuid>,
    pub status: String,
    pub quotation_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub currency: String,
    pub subtotal: Decimal,
    pub sgst_amount: Decimal,
    pub cgst_amount: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<QuotationRow> for QuotationDocument {
    type Error = DatabaseError;

    fn try_from(row: QuotationRow) -> Result<Self, Self::Error> {
        let currency: Currency = row
            .currency
            .parse()
            .map_err(|e| DatabaseError::corrupt("quotations", e))?;
        let status: QuotationStatus = row
            .status
            .parse()
            .map_err(|e| DatabaseError::corrupt("quotations", e))?;

        Ok(QuotationDocument {
            id: QuotationId::from_uuid(row.quotation_id),
            quotation_number: row.quotation_number,
            client_id: row.client_id.map(ClientId::from_uuid),
            status,
            quotation_date: row.quotation_date,
            valid_until: row.valid_until,
            currency,
            totals: TotalsSnapshot {
                subtotal: Money::new(row.subtotal, currency),
                sgst_amount: Money::new(row.sgst_amount, currency),
                cgst_amount: Money::new(row.cgst_amount, currency),
                total: Money::new(row.total_amount, currency),
            },
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LineItemRow {
    pub line_item_id: Uuid,
    pub quotation_id: Uuid,
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub tax_rate_percent: Decimal,
    pub display_order: i32,
    pub notes: Option<String>,
}

impl TryFrom<LineItemRow> for QuotationLineItem {
    type Error = DatabaseError;

    /// Amounts are recomputed from quantity and rate rather than read back
    fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
        let display_order = u32::try_from(row.display_order).map_err(|_| {
            DatabaseError::corrupt("quotation_line_items", format!("display_order {}", row.display_order))
        })?;
        QuotationLineItem::restore(
            LineItemId::from_uuid(row.line_item_id),
            QuotationId::from_uuid(row.quotation_id),
            row.description,
            row.quantity,
            row.rate,
            row.tax_rate_percent,
            display_order,
            row.notes,
        )
        .map_err(|e| DatabaseError::corrupt("quotation_line_items", e))
    }
}

/// PostgreSQL-backed implementation of [`QuotationPort`] and
/// [`QuotationNumberSequence`]
#[derive(Debug, Clone)]
pub struct PostgresQuotationStore {
    pool: PgPool,
    number_prefix: String,
}

impl PostgresQuotationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            number_prefix: QUOTATION_NUMBER_PREFIX.to_string(),
        }
    }

    pub fn with_number_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.number_prefix = prefix.into();
        self
    }

    async fn fetch_quotation(&self, id: QuotationId) -> Result<QuotationDocument, DatabaseError> {
        let row: Option<QuotationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM quotations WHERE quotation_id = $1",
            QUOTATION_COLUMNS
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DatabaseError::not_found("Quotation", id))?
            .try_into()
    }
}

impl DomainPort for PostgresQuotationStore {}

#[async_trait]
impl QuotationPort for PostgresQuotationStore {
    #[instrument(skip(self, _metadata), fields(quotation_id = %id))]
    async fn get_quotation(
        &self,
        id: QuotationId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDocument, PortError> {
        Ok(self.fetch_quotation(id).await?)
    }

    #[instrument(skip(self, _metadata))]
    async fn find_quotations(
        &self,
        query: QuotationQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<QuotationDocument>, PortError> {
        let rows: Vec<QuotationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM quotations \
             WHERE ($1::uuid IS NULL OR client_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
             ORDER BY quotation_date DESC, created_at DESC",
            QUOTATION_COLUMNS
        ))
        .bind(query.client_id.map(|id| *id.as_uuid()))
        .bind(query.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| QuotationDocument::try_from(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, _metadata), fields(quotation_id = %quotation_id))]
    async fn list_line_items(
        &self,
        quotation_id: QuotationId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<QuotationLineItem>, PortError> {
        let rows: Vec<LineItemRow> = sqlx::query_as(&format!(
            "SELECT {} FROM quotation_line_items WHERE quotation_id = $1 ORDER BY display_order",
            LINE_ITEM_COLUMNS
        ))
        .bind(*quotation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| QuotationLineItem::try_from(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, document, items, _metadata), fields(quotation_id = %document.id, lines = items.len()))]
    async fn save_quotation(
        &self,
        document: &QuotationDocument,
        items: &[QuotationLineItem],
        _metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDocument, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        let totals = &document.totals;

        let row: QuotationRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO quotations (
                quotation_id, quotation_number, client_id, status, quotation_date,
                valid_until, currency, subtotal, sgst_amount, cgst_amount,
                total_amount, notes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, now())
            ON CONFLICT (quotation_id) DO UPDATE SET
                quotation_number = EXCLUDED.quotation_number,
                client_id = EXCLUDED.client_id,
                status = EXCLUDED.status,
                quotation_date = EXCLUDED.quotation_date,
                valid_until = EXCLUDED.valid_until,
                currency = EXCLUDED.currency,
                subtotal = EXCLUDED.subtotal,
                sgst_amount = EXCLUDED.sgst_amount,
                cgst_amount = EXCLUDED.cgst_amount,
                total_amount = EXCLUDED.total_amount,
                notes = EXCLUDED.notes,
                updated_at = now()
            RETURNING {}
            "#,
            QUOTATION_COLUMNS
        ))
        .bind(*document.id.as_uuid())
        .bind(document.quotation_number.as_deref())
        .bind(document.client_id.map(|id| *id.as_uuid()))
        .bind(document.status.as_str())
        .bind(document.quotation_date)
        .bind(document.valid_until)
        .bind(document.currency.code())
        .bind(totals.subtotal.amount())
        .bind(totals.sgst_amount.amount())
        .bind(totals.cgst_amount.amount())
        .bind(totals.total.amount())
        .bind(document.notes.as_deref())
        .bind(document.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        sqlx::query("DELETE FROM quotation_line_items WHERE quotation_id = $1")
            .bind(*document.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;

        for item in items {
            let display_order = i32::try_from(item.display_order)
                .map_err(|_| PortError::validation(format!("display order {} is out of range", item.display_order)))?;
            sqlx::query(
                r#"
                INSERT INTO quotation_line_items (
                    line_item_id, quotation_id, description, quantity, rate,
                    tax_rate_percent, amount, display_order, notes
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(*item.id.as_uuid())
            .bind(*document.id.as_uuid())
            .bind(item.description())
            .bind(item.quantity())
            .bind(item.rate())
            .bind(item.tax_rate_percent())
            .bind(item.amount())
            .bind(display_order)
            .bind(item.notes.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;
        }

        let saved = QuotationDocument::try_from(row)?;
        tx.commit().await.map_err(DatabaseError::from)?;
        debug!(quotation_number = saved.display_number(), "Quotation persisted");
        Ok(saved)
    }

    #[instrument(skip(self, _metadata), fields(quotation_id = %id, status = %status))]
    async fn update_status(
        &self,
        id: QuotationId,
        status: QuotationStatus,
        _metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDocument, PortError> {
        let row: Option<QuotationRow> = sqlx::query_as(&format!(
            "UPDATE quotations SET status = $2, updated_at = now() WHERE quotation_id = $1 RETURNING {}",
            QUOTATION_COLUMNS
        ))
        .bind(*id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let row = row.ok_or_else(|| DatabaseError::not_found("Quotation", id))?;
        Ok(QuotationDocument::try_from(row)?)
    }
}

#[async_trait]
impl QuotationNumberSequence for PostgresQuotationStore {
    #[instrument(skip(self, _metadata))]
    async fn next_number(&self, _metadata: Option<OperationMetadata>) -> Result<String, PortError> {
        let value: i64 = sqlx::query_scalar("SELECT nextval('quotation_number_seq')")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        let value = u64::try_from(value)
            .map_err(|_| DatabaseError::corrupt("quotation_number_seq", format!("negative value {}", value)))?;
        Ok(format_quotation_number(&self.number_prefix, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row() -> QuotationRow {
        let now = Utc::now();
        QuotationRow {
            quotation_id: Uuid::new_v4(),
            quotation_number: Some("QT-00042".into()),
            client_id: Some(Uuid::new_v4()),
            status: "sent".into(),
            quotation_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            valid_until: None,
            currency: "INR".into(),
            subtotal: dec!(2000),
            sgst_amount: dec!(150),
            cgst_amount: dec!(150),
            total_amount: dec!(2300),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_quotation_row_converts_with_snapshot() {
        let document = QuotationDocument::try_from(row()).unwrap();
        assert_eq!(document.status, QuotationStatus::Sent);
        assert_eq!(document.display_number(), "QT-00042");
        assert_eq!(document.totals.total, Money::new(dec!(2300), Currency::INR));
        assert_eq!(document.totals.tax_total(), Money::new(dec!(300), Currency::INR));
    }

    #[test]
    fn test_unknown_currency_is_corrupt_row() {
        let r = QuotationRow {
            currency: "XYZ".into(),
            ..row()
        };
        assert!(matches!(
            QuotationDocument::try_from(r),
            Err(DatabaseError::CorruptRow { table: "quotations", .. })
        ));
    }

    #[test]
    fn test_line_item_amount_is_recomputed() {
        let r = LineItemRow {
            line_item_id: Uuid::new_v4(),
            quotation_id: Uuid::new_v4(),
            description: "Tiles".into(),
            quantity: dec!(2),
            rate: dec!(500),
            tax_rate_percent: dec!(18),
            display_order: 3,
            notes: None,
        };
        let item = QuotationLineItem::try_from(r).unwrap();
        assert_eq!(item.amount(), dec!(1000));
        assert_eq!(item.display_order, 3);
    }

    #[test]
    fn test_negative_line_values_are_rejected() {
        let r = LineItemRow {
            line_item_id: Uuid::new_v4(),
            quotation_id: Uuid::new_v4(),
            description: String::new(),
            quantity: dec!(-1),
            rate: dec!(500),
            tax_rate_percent: dec!(18),
            display_order: 0,
            notes: None,
        };
        assert!(QuotationLineItem::try_from(r).is_err());
    }

    /// What a `NUMERIC(19, 4)` column hands back: half away from zero
    fn stored(value: Decimal) -> Decimal {
        value.round_dp_with_strategy(4, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    }

    #[test]
    fn test_reloaded_lines_price_like_the_saved_snapshot() {
        use domain_quotation::TaxEngine;

        let quotation_id = QuotationId::new();
        let saved = vec![
            QuotationLineItem::new(quotation_id, "Grout", dec!(1.00005), dec!(1), dec!(18)).unwrap(),
            QuotationLineItem::new(quotation_id, "Sealant", dec!(3), dec!(0.33335), dec!(12.00005)).unwrap(),
        ];
        let snapshot = TaxEngine::compute(&saved, Currency::INR).snapshot();

        let reloaded: Vec<QuotationLineItem> = saved
            .iter()
            .map(|item| {
                QuotationLineItem::try_from(LineItemRow {
                    line_item_id: *item.id.as_uuid(),
                    quotation_id: *quotation_id.as_uuid(),
                    description: item.description().to_string(),
                    quantity: stored(item.quantity()),
                    rate: stored(item.rate()),
                    tax_rate_percent: stored(item.tax_rate_percent()),
                    display_order: item.display_order as i32,
                    notes: None,
                })
                .unwrap()
            })
            .collect();

        assert_eq!(reloaded, saved);
        assert!(TaxEngine::compute(&reloaded, Currency::INR).matches(&snapshot));
        assert_eq!(snapshot.subtotal.amount(), dec!(2.0003));
    }

    proptest::proptest! {
        #[test]
        fn test_stored_line_amount_is_quantity_times_rate(
            quantity in 0i64..10_000_000i64,
            rate in 0i64..1_000_000_000i64,
            order in 0i32..500,
        ) {
            let r = LineItemRow {
                line_item_id: Uuid::new_v4(),
                quotation_id: Uuid::new_v4(),
                description: "Tiles".into(),
                quantity: Decimal::new(quantity, 3),
                rate: Decimal::new(rate, 2),
                tax_rate_percent: dec!(18),
                display_order: order,
                notes: None,
            };
            let item = QuotationLineItem::try_from(r).unwrap();
            proptest::prop_assert_eq!(item.amount(), Decimal::new(quantity, 3) * Decimal::new(rate, 2));
            proptest::prop_assert_eq!(item.display_order, order as u32);
        }
    }
}
