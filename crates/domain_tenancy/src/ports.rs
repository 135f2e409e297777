//! Tenancy Ledger Port
//!
//! The payment family of the ledger access layer. Implementations persist
//! tenancies and their payment entries and carry no business rules;
//! validation and duplicate detection live in [`crate::service`].
//!
//! # Atomicity
//!
//! `record_payment` inserts the ledger entry and refreshes the tenancy's cached
//! status fields as one unit. An implementation must either apply both writes
//! or neither.
//!
//! ```rust,ignore
//! let port: Arc<dyn TenancyLedgerPort> = Arc::new(PostgresTenancyLedger::new(pool));
//! let service = TenancyLedgerService::new(port);
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;

use core_kernel::{DomainPort, OperationMetadata, PaymentEntryId, PortError, TenancyId};

use crate::ledger::{NewPaymentEntry, PaymentLedgerEntry, PaymentStatusUpdate};
use crate::tenancy::{LeaseStatus, Tenancy};

/// Filter for listing tenancies
#[derive(Debug, Clone, Default)]
pub struct TenancyQuery {
    /// Restrict to these ids
    pub ids: Option<Vec<TenancyId>>,
    pub lease_status: Option<LeaseStatus>,
}

impl TenancyQuery {
    pub fn by_ids(ids: Vec<TenancyId>) -> Self {
        Self {
            ids: Some(ids),
            ..Default::default()
        }
    }

    pub fn matches(&self, tenancy: &Tenancy) -> bool {
        if let Some(ref ids) = self.ids {
            if !ids.contains(&tenancy.id) {
                return false;
            }
        }
        if let Some(status) = self.lease_status {
            if tenancy.lease_status != status {
                return false;
            }
        }
        true
    }
}

/// Persistence operations for tenancies and their payment ledger
#[async_trait]
pub trait TenancyLedgerPort: DomainPort {
    /// Retrieves a tenancy, or `PortError::NotFound`
    async fn get_tenancy(
        &self,
        id: TenancyId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Tenancy, PortError>;

    /// Lists tenancies matching the query, ordered by lease start
    async fn list_tenancies(
        &self,
        query: TenancyQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Tenancy>, PortError>;

    /// Inserts or replaces a tenancy row
    async fn save_tenancy(
        &self,
        tenancy: &Tenancy,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// All entries of a tenancy, ordered by payment date
    async fn list_entries(
        &self,
        tenancy_id: TenancyId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<PaymentLedgerEntry>, PortError>;

    /// Entries with `from <= payment_date <= to`
    async fn find_entries_between(
        &self,
        tenancy_id: TenancyId,
        from: NaiveDate,
        to: NaiveDate,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<PaymentLedgerEntry>, PortError>;

    /// Appends an entry without touching the tenancy
    async fn append_entry(
        &self,
        entry: NewPaymentEntry,
        metadata: Option<OperationMetadata>,
    ) -> Result<PaymentLedgerEntry, PortError>;

    /// Appends an entry and applies `update` to the tenancy atomically
    async fn record_payment(
        &self,
        entry: NewPaymentEntry,
        update: PaymentStatusUpdate,
        metadata: Option<OperationMetadata>,
    ) -> Result<(PaymentLedgerEntry, Tenancy), PortError>;

    /// Removes a ledger entry (administrative action)
    async fn delete_entry(
        &self,
        entry_id: PaymentEntryId,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Sets the externally maintained next payment date
    async fn update_next_payment_date(
        &self,
        tenancy_id: TenancyId,
        next_payment_date: Option<NaiveDate>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Tenancy, PortError>;
}

/// Convenience methods over [`TenancyLedgerPort`]
#[async_trait]
pub trait TenancyLedgerPortExt: TenancyLedgerPort {
    /// Entries dated inside `month`
    async fn entries_in_month(
        &self,
        tenancy_id: TenancyId,
        month: core_kernel::BillingMonth,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<PaymentLedgerEntry>, PortError> {
        self.find_entries_between(tenancy_id, month.first_day(), month.last_day(), metadata)
            .await
    }
}

impl<T: TenancyLedgerPort + ?Sized> TenancyLedgerPortExt for T {}

/// In-memory implementation of TenancyLedgerPort for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Stores tenancies and entries in memory
    ///
    /// `fail_writes` makes every write return a connection error without
    /// mutating anything. `fail_status_updates` fails only the tenancy half
    /// of `record_payment`, which must then leave the ledger untouched too.
    #[derive(Debug, Default)]
    pub struct MockTenancyLedgerPort {
        tenancies: Arc<RwLock<HashMap<TenancyId, Tenancy>>>,
        entries: Arc<RwLock<Vec<PaymentLedgerEntry>>>,
        fail_writes: AtomicBool,
        fail_status_updates: AtomicBool,
    }

    impl MockTenancyLedgerPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with tenancies
        pub async fn with_tenancies(tenancies: Vec<Tenancy>) -> Self {
            let port = Self::new();
            {
                let mut stored = port.tenancies.write().await;
                for tenancy in tenancies {
                    stored.insert(tenancy.id, tenancy);
                }
            }
            port
        }

        /// Pre-populates ledger entries as if written earlier
        pub async fn seed_entries(&self, entries: Vec<PaymentLedgerEntry>) {
            self.entries.write().await.extend(entries);
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_status_updates(&self, fail: bool) {
            self.fail_status_updates.store(fail, Ordering::SeqCst);
        }

        pub async fn entry_count(&self) -> usize {
            self.entries.read().await.len()
        }

        /// Current stored tenancy, bypassing failure injection
        pub async fn stored_tenancy(&self, id: TenancyId) -> Option<Tenancy> {
            self.tenancies.read().await.get(&id).cloned()
        }

        fn check_writable(&self) -> Result<(), PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::connection("injected write failure"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockTenancyLedgerPort {}

    #[async_trait]
    impl TenancyLedgerPort for MockTenancyLedgerPort {
        async fn get_tenancy(
            &self,
            id: TenancyId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Tenancy, PortError> {
            self.tenancies
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Tenancy", id))
        }

        async fn list_tenancies(
            &self,
            query: TenancyQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Tenancy>, PortError> {
            let tenancies = self.tenancies.read().await;
            let mut results: Vec<Tenancy> = tenancies
                .values()
                .filter(|t| query.matches(t))
                .cloned()
                .collect();
            results.sort_by_key(|t| (t.lease_start_date, t.id));
            Ok(results)
        }

        async fn save_tenancy(
            &self,
            tenancy: &Tenancy,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.check_writable()?;
            self.tenancies.write().await.insert(tenancy.id, tenancy.clone());
            Ok(())
        }

        async fn list_entries(
            &self,
            tenancy_id: TenancyId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<PaymentLedgerEntry>, PortError> {
            let mut results: Vec<PaymentLedgerEntry> = self
                .entries
                .read()
                .await
                .iter()
                .filter(|e| e.tenancy_id == tenancy_id)
                .cloned()
                .collect();
            results.sort_by_key(|e| (e.payment_date, e.created_at));
            Ok(results)
        }

        async fn find_entries_between(
            &self,
            tenancy_id: TenancyId,
            from: NaiveDate,
            to: NaiveDate,
            metadata: Option<OperationMetadata>,
        ) -> Result<Vec<PaymentLedgerEntry>, PortError> {
            let entries = self.list_entries(tenancy_id, metadata).await?;
            Ok(entries
                .into_iter()
                .filter(|e| e.payment_date >= from && e.payment_date <= to)
                .collect())
        }

        async fn append_entry(
            &self,
            entry: NewPaymentEntry,
            _metadata: Option<OperationMetadata>,
        ) -> Result<PaymentLedgerEntry, PortError> {
            self.check_writable()?;
            if !self.tenancies.read().await.contains_key(&entry.tenancy_id) {
                return Err(PortError::not_found("Tenancy", entry.tenancy_id));
            }
            let stored = entry.into_entry(PaymentEntryId::new_v7(), Utc::now());
            self.entries.write().await.push(stored.clone());
            Ok(stored)
        }

        async fn record_payment(
            &self,
            entry: NewPaymentEntry,
            update: PaymentStatusUpdate,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(PaymentLedgerEntry, Tenancy), PortError> {
            self.check_writable()?;

            // Both locks are held for the whole unit of work.
            let mut tenancies = self.tenancies.write().await;
            let mut entries = self.entries.write().await;

            let tenancy = tenancies
                .get_mut(&entry.tenancy_id)
                .ok_or_else(|| PortError::not_found("Tenancy", entry.tenancy_id))?;
            if self.fail_status_updates.load(Ordering::SeqCst) {
                return Err(PortError::internal("injected status update failure"));
            }

            let stored = entry.into_entry(PaymentEntryId::new_v7(), Utc::now());
            tenancy.apply_status_update(&update);
            entries.push(stored.clone());
            Ok((stored, tenancy.clone()))
        }

        async fn delete_entry(
            &self,
            entry_id: PaymentEntryId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.check_writable()?;
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|e| e.id != entry_id);
            if entries.len() == before {
                return Err(PortError::not_found("PaymentLedgerEntry", entry_id));
            }
            Ok(())
        }

        async fn update_next_payment_date(
            &self,
            tenancy_id: TenancyId,
            next_payment_date: Option<NaiveDate>,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Tenancy, PortError> {
            self.check_writable()?;
            let mut tenancies = self.tenancies.write().await;
            let tenancy = tenancies
                .get_mut(&tenancy_id)
                .ok_or_else(|| PortError::not_found("Tenancy", tenancy_id))?;
            tenancy.next_payment_date = next_payment_date;
            tenancy.updated_at = Utc::now();
            Ok(tenancy.clone())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use core_kernel::{Currency, Money, PropertyId};
        use rust_decimal_macros::dec;

        fn date(y: i32, m: u32, d: u32) -> NaiveDate {
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        }

        fn tenancy() -> Tenancy {
            Tenancy::new(
                PropertyId::new(),
                None,
                date(2025, 1, 1),
                date(2025, 12, 31),
                Money::new(dec!(20000), Currency::INR),
                1,
            )
            .unwrap()
        }

        fn payment(t: &Tenancy, on: NaiveDate) -> NewPaymentEntry {
            NewPaymentEntry::new(t.id, t.rental_amount, on)
        }

        #[tokio::test]
        async fn test_record_payment_applies_both_writes() {
            let t = tenancy();
            let port = MockTenancyLedgerPort::with_tenancies(vec![t.clone()]).await;

            let (entry, updated) = port
                .record_payment(payment(&t, date(2025, 3, 15)), PaymentStatusUpdate::paid_on(date(2025, 3, 15)), None)
                .await
                .unwrap();

            assert_eq!(entry.tenancy_id, t.id);
            assert_eq!(updated.last_payment_date, Some(date(2025, 3, 15)));
            assert_eq!(port.entry_count().await, 1);
        }

        #[tokio::test]
        async fn test_status_failure_leaves_ledger_untouched() {
            let t = tenancy();
            let port = MockTenancyLedgerPort::with_tenancies(vec![t.clone()]).await;
            port.set_fail_status_updates(true);

            let result = port
                .record_payment(payment(&t, date(2025, 3, 15)), PaymentStatusUpdate::paid_on(date(2025, 3, 15)), None)
                .await;

            assert!(result.is_err());
            assert_eq!(port.entry_count().await, 0);
            assert_eq!(port.stored_tenancy(t.id).await.unwrap().last_payment_date, None);
        }

        #[tokio::test]
        async fn test_find_entries_between_is_inclusive() {
            let t = tenancy();
            let port = MockTenancyLedgerPort::with_tenancies(vec![t.clone()]).await;
            for day in [date(2025, 2, 28), date(2025, 3, 1), date(2025, 3, 31), date(2025, 4, 1)] {
                port.append_entry(payment(&t, day), None).await.unwrap();
            }

            let march = port
                .find_entries_between(t.id, date(2025, 3, 1), date(2025, 3, 31), None)
                .await
                .unwrap();
            assert_eq!(march.len(), 2);
        }

        #[tokio::test]
        async fn test_list_filters_by_ids_and_lease_status() {
            let active = tenancy();
            let mut ended = tenancy();
            ended.lease_status = LeaseStatus::Expired;
            let port = MockTenancyLedgerPort::with_tenancies(vec![active.clone(), ended.clone()]).await;

            let both = port
                .list_tenancies(TenancyQuery::by_ids(vec![active.id, ended.id]), None)
                .await
                .unwrap();
            assert_eq!(both.len(), 2);

            let query = TenancyQuery {
                lease_status: Some(LeaseStatus::Expired),
                ..Default::default()
            };
            let expired = port.list_tenancies(query, None).await.unwrap();
            assert_eq!(expired.len(), 1);
            assert_eq!(expired[0].id, ended.id);
        }

        #[tokio::test]
        async fn test_delete_unknown_entry_is_not_found() {
            let port = MockTenancyLedgerPort::new();
            let err = port.delete_entry(PaymentEntryId::new(), None).await.unwrap_err();
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn test_append_requires_existing_tenancy() {
            let port = MockTenancyLedgerPort::new();
            let err = port.append_entry(payment(&tenancy(), date(2025, 1, 1)), None).await.unwrap_err();
            assert!(err.is_not_found());
        }
    }
}
