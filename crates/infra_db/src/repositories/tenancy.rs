//! PostgreSQL tenancy ledger
//!
//! Implements [`TenancyLedgerPort`] over the `tenancies` and
//! `payment_ledger_entries` tables. `record_payment` runs in one transaction
//! and locks the tenancy row so that the entry insert and the status refresh
//! land together.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    ClientId, Currency, DomainPort, Money, OperationMetadata, PaymentEntryId, PortError, PropertyId,
    TenancyId,
};
use domain_tenancy::{
    LeaseStatus, NewPaymentEntry, PaymentLedgerEntry, PaymentStatus, PaymentStatusUpdate, Tenancy,
    TenancyLedgerPort, TenancyQuery,
};

use crate::error::DatabaseError;

const TENANCY_COLUMNS: &str = "tenancy_id, property_id, client_id, lease_start_date, lease_end_date, \
    rental_amount, currency, rent_due_day, lease_status, payment_status, last_payment_date, \
    next_payment_date, created_at, updated_at";

const ENTRY_COLUMNS: &str = "entry_id, tenancy_id, amount, currency, payment_date, payment_method, \
    reference_number, notes, created_at";

#[derive(Debug, Clone, FromRow)]
pub struct TenancyRow {
    pub tenancy_id: Uuid,
    pub property_id: Uuid,
    pub client_id: Option<Uuid>,
    pub lease_start_date: NaiveDate,
    pub lease_end_date: NaiveDate,
    pub rental_amount: Decimal,
    pub currency: String,
    pub rent_due_day: i16,
    pub lease_status: String,
    pub payment_status: String,
    pub last_payment_date: Option<NaiveDate>,
    pub next_payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TenancyRow> for Tenancy {
    type Error = DatabaseError;

    fn try_from(row: TenancyRow) -> Result<Self, Self::Error> {
        let currency: Currency = row
            .currency
            .parse()
            .map_err(|e| DatabaseError::corrupt("tenancies", e))?;
        let lease_status: LeaseStatus = row
            .lease_status
            .parse()
            .map_err(|e| DatabaseError::corrupt("tenancies", e))?;
        let payment_status: PaymentStatus = row
            .payment_status
            .parse()
            .map_err(|e| DatabaseError::corrupt("tenancies", e))?;
        let rent_due_day = u8::try_from(row.rent_due_day)
            .map_err(|_| DatabaseError::corrupt("tenancies", format!("rent_due_day {}", row.rent_due_day)))?;

        Ok(Tenancy {
            id: TenancyId::from_uuid(row.tenancy_id),
            property_id: PropertyId::from_uuid(row.property_id),
            client_id: row.client_id.map(ClientId::from_uuid),
            lease_start_date: row.lease_start_date,
            lease_end_date: row.lease_end_date,
            rental_amount: Money::new(row.rental_amount, currency),
            rent_due_day,
            lease_status,
            payment_status,
            last_payment_date: row.last_payment_date,
            next_payment_date: row.next_payment_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PaymentEntryRow {
    pub entry_id: Uuid,
    pub tenancy_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PaymentEntryRow> for PaymentLedgerEntry {
    type Error = DatabaseError;

    fn try_from(row: PaymentEntryRow) -> Result<Self, Self::Error> {
        let currency: Currency = row
            .currency
            .parse()
            .map_err(|e| DatabaseError::corrupt("payment_ledger_entries", e))?;
        Ok(PaymentLedgerEntry {
            id: PaymentEntryId::from_uuid(row.entry_id),
            tenancy_id: TenancyId::from_uuid(row.tenancy_id),
            amount: Money::new(row.amount, currency),
            payment_date: row.payment_date,
            payment_method: row.payment_method,
            reference_number: row.reference_number,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

fn to_entries(rows: Vec<PaymentEntryRow>) -> Result<Vec<PaymentLedgerEntry>, PortError> {
    rows.into_iter()
        .map(|row| PaymentLedgerEntry::try_from(row).map_err(PortError::from))
        .collect()
}

/// PostgreSQL-backed implementation of [`TenancyLedgerPort`]
#[derive(Debug, Clone)]
pub struct PostgresTenancyLedger {
    pool: PgPool,
}

impl PostgresTenancyLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_tenancy(&self, id: TenancyId) -> Result<Tenancy, DatabaseError> {
        let row: Option<TenancyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tenancies WHERE tenancy_id = $1",
            TENANCY_COLUMNS
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DatabaseError::not_found("Tenancy", id))?
            .try_into()
    }

    async fn insert_entry(
        tx: &mut Transaction<'_, Postgres>,
        entry: NewPaymentEntry,
    ) -> Result<PaymentLedgerEntry, DatabaseError> {
        let stored = entry.into_entry(PaymentEntryId::new_v7(), Utc::now());
        sqlx::query(
            r#"
            INSERT INTO payment_ledger_entries (
                entry_id, tenancy_id, amount, currency, payment_date,
                payment_method, reference_number, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*stored.id.as_uuid())
        .bind(*stored.tenancy_id.as_uuid())
        .bind(stored.amount.amount())
        .bind(stored.amount.currency().code())
        .bind(stored.payment_date)
        .bind(stored.payment_method.as_deref())
        .bind(stored.reference_number.as_deref())
        .bind(stored.notes.as_deref())
        .bind(stored.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(stored)
    }

    async fn lock_tenancy(
        tx: &mut Transaction<'_, Postgres>,
        id: TenancyId,
    ) -> Result<(), DatabaseError> {
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT tenancy_id FROM tenancies WHERE tenancy_id = $1 FOR UPDATE")
                .bind(*id.as_uuid())
                .fetch_optional(&mut **tx)
                .await?;
        locked
            .map(|_| ())
            .ok_or_else(|| DatabaseError::not_found("Tenancy", id))
    }
}

impl DomainPort for PostgresTenancyLedger {}

#[async_trait]
impl TenancyLedgerPort for PostgresTenancyLedger {
    #[instrument(skip(self, _metadata), fields(tenancy_id = %id))]
    async fn get_tenancy(
        &self,
        id: TenancyId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Tenancy, PortError> {
        Ok(self.fetch_tenancy(id).await?)
    }

    #[instrument(skip(self, _metadata))]
    async fn list_tenancies(
        &self,
        query: TenancyQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Tenancy>, PortError> {
        let ids: Option<Vec<Uuid>> = query
            .ids
            .as_ref()
            .map(|ids| ids.iter().map(|id| *id.as_uuid()).collect());
        let rows: Vec<TenancyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tenancies \
             WHERE ($1::uuid[] IS NULL OR tenancy_id = ANY($1)) \
               AND ($2::text IS NULL OR lease_status = $2) \
             ORDER BY lease_start_date, tenancy_id",
            TENANCY_COLUMNS
        ))
        .bind(ids)
        .bind(query.lease_status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        debug!(count = rows.len(), "Tenancies listed");
        rows.into_iter()
            .map(|row| Tenancy::try_from(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, tenancy, _metadata), fields(tenancy_id = %tenancy.id))]
    async fn save_tenancy(
        &self,
        tenancy: &Tenancy,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO tenancies (
                tenancy_id, property_id, client_id, lease_start_date, lease_end_date,
                rental_amount, currency, rent_due_day, lease_status, payment_status,
                last_payment_date, next_payment_date, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (tenancy_id) DO UPDATE SET
                property_id = EXCLUDED.property_id,
                client_id = EXCLUDED.client_id,
                lease_start_date = EXCLUDED.lease_start_date,
                lease_end_date = EXCLUDED.lease_end_date,
                rental_amount = EXCLUDED.rental_amount,
                currency = EXCLUDED.currency,
                rent_due_day = EXCLUDED.rent_due_day,
                lease_status = EXCLUDED.lease_status,
                payment_status = EXCLUDED.payment_status,
                last_payment_date = EXCLUDED.last_payment_date,
                next_payment_date = EXCLUDED.next_payment_date,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(*tenancy.id.as_uuid())
        .bind(*tenancy.property_id.as_uuid())
        .bind(tenancy.client_id.map(|id| *id.as_uuid()))
        .bind(tenancy.lease_start_date)
        .bind(tenancy.lease_end_date)
        .bind(tenancy.rental_amount.amount())
        .bind(tenancy.rental_amount.currency().code())
        .bind(i16::from(tenancy.rent_due_day))
        .bind(tenancy.lease_status.as_str())
        .bind(tenancy.payment_status.as_str())
        .bind(tenancy.last_payment_date)
        .bind(tenancy.next_payment_date)
        .bind(tenancy.created_at)
        .bind(tenancy.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    #[instrument(skip(self, _metadata), fields(tenancy_id = %tenancy_id))]
    async fn list_entries(
        &self,
        tenancy_id: TenancyId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<PaymentLedgerEntry>, PortError> {
        let rows: Vec<PaymentEntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_ledger_entries WHERE tenancy_id = $1 \
             ORDER BY payment_date, created_at",
            ENTRY_COLUMNS
        ))
        .bind(*tenancy_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        to_entries(rows)
    }

    #[instrument(skip(self, _metadata), fields(tenancy_id = %tenancy_id))]
    async fn find_entries_between(
        &self,
        tenancy_id: TenancyId,
        from: NaiveDate,
        to: NaiveDate,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<PaymentLedgerEntry>, PortError> {
        let rows: Vec<PaymentEntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_ledger_entries \
             WHERE tenancy_id = $1 AND payment_date BETWEEN $2 AND $3 \
             ORDER BY payment_date, created_at",
            ENTRY_COLUMNS
        ))
        .bind(*tenancy_id.as_uuid())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        to_entries(rows)
    }

    #[instrument(skip(self, entry, _metadata), fields(tenancy_id = %entry.tenancy_id))]
    async fn append_entry(
        &self,
        entry: NewPaymentEntry,
        _metadata: Option<OperationMetadata>,
    ) -> Result<PaymentLedgerEntry, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        Self::lock_tenancy(&mut tx, entry.tenancy_id).await?;
        let stored = Self::insert_entry(&mut tx, entry).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(stored)
    }

    #[instrument(skip(self, entry, update, _metadata), fields(tenancy_id = %entry.tenancy_id))]
    async fn record_payment(
        &self,
        entry: NewPaymentEntry,
        update: PaymentStatusUpdate,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(PaymentLedgerEntry, Tenancy), PortError> {
        let tenancy_id = entry.tenancy_id;
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        Self::lock_tenancy(&mut tx, tenancy_id).await?;
        let stored = Self::insert_entry(&mut tx, entry).await?;

        let row: TenancyRow = sqlx::query_as(&format!(
            "UPDATE tenancies SET last_payment_date = $2, payment_status = $3, updated_at = now() \
             WHERE tenancy_id = $1 RETURNING {}",
            TENANCY_COLUMNS
        ))
        .bind(*tenancy_id.as_uuid())
        .bind(update.last_payment_date)
        .bind(update.payment_status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;
        let tenancy = Tenancy::try_from(row)?;

        // Dropping the transaction without commit rolls both writes back.
        tx.commit().await.map_err(DatabaseError::from)?;
        debug!(entry_id = %stored.id, "Payment recorded");
        Ok((stored, tenancy))
    }

    #[instrument(skip(self, _metadata), fields(entry_id = %entry_id))]
    async fn delete_entry(
        &self,
        entry_id: PaymentEntryId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM payment_ledger_entries WHERE entry_id = $1")
            .bind(*entry_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("PaymentLedgerEntry", entry_id).into());
        }
        Ok(())
    }

    #[instrument(skip(self, _metadata), fields(tenancy_id = %tenancy_id))]
    async fn update_next_payment_date(
        &self,
        tenancy_id: TenancyId,
        next_payment_date: Option<NaiveDate>,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Tenancy, PortError> {
        let row: Option<TenancyRow> = sqlx::query_as(&format!(
            "UPDATE tenancies SET next_payment_date = $2, updated_at = now() \
             WHERE tenancy_id = $1 RETURNING {}",
            TENANCY_COLUMNS
        ))
        .bind(*tenancy_id.as_uuid())
        .bind(next_payment_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let row = row.ok_or_else(|| DatabaseError::not_found("Tenancy", tenancy_id))?;
        Ok(Tenancy::try_from(row)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row() -> TenancyRow {
        let now = Utc::now();
        TenancyRow {
            tenancy_id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            client_id: None,
            lease_start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            lease_end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            rental_amount: dec!(25000),
            currency: "INR".into(),
            rent_due_day: 5,
            lease_status: "active".into(),
            payment_status: "late".into(),
            last_payment_date: None,
            next_payment_date: NaiveDate::from_ymd_opt(2025, 2, 5),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tenancy_row_converts() {
        let r = row();
        let id = r.tenancy_id;
        let tenancy = Tenancy::try_from(r).unwrap();
        assert_eq!(*tenancy.id.as_uuid(), id);
        assert_eq!(tenancy.rental_amount, Money::new(dec!(25000), Currency::INR));
        assert_eq!(tenancy.payment_status, PaymentStatus::Late);
        assert_eq!(tenancy.rent_due_day, 5);
    }

    #[test]
    fn test_unknown_status_is_corrupt_row() {
        let r = TenancyRow {
            lease_status: "evicted".into(),
            ..row()
        };
        let err = Tenancy::try_from(r).unwrap_err();
        assert!(matches!(err, DatabaseError::CorruptRow { table: "tenancies", .. }));
    }

    #[test]
    fn test_negative_due_day_is_corrupt_row() {
        let r = TenancyRow {
            rent_due_day: -1,
            ..row()
        };
        assert!(Tenancy::try_from(r).is_err());
    }

    #[test]
    fn test_entry_row_converts() {
        let r = PaymentEntryRow {
            entry_id: Uuid::new_v4(),
            tenancy_id: Uuid::new_v4(),
            amount: dec!(25000),
            currency: "INR".into(),
            payment_date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            payment_method: Some("UPI".into()),
            reference_number: None,
            notes: None,
            created_at: Utc::now(),
        };
        let entry = PaymentLedgerEntry::try_from(r).unwrap();
        assert_eq!(entry.billing_month().to_string(), "2025-03");
        assert_eq!(entry.payment_method.as_deref(), Some("UPI"));
    }
}
