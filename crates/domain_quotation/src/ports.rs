//! Quotation Ports
//!
//! The line-item family of the ledger access layer plus the external number
//! sequence. `save_quotation` upserts the document and replaces its line items
//! wholesale as one unit: either the new document row and the full new item
//! list are stored, or nothing changes.

use async_trait::async_trait;

use core_kernel::{ClientId, DomainPort, OperationMetadata, PortError, QuotationId};

use crate::line_item::QuotationLineItem;
use crate::quotation::{QuotationDocument, QuotationStatus};

/// Prefix of human-readable quotation numbers
pub const QUOTATION_NUMBER_PREFIX: &str = "QT";

/// Formats a raw sequence value, e.g. `QT-00042`
pub fn format_quotation_number(prefix: &str, value: u64) -> String {
    format!("{}-{:05}", prefix, value)
}

#[derive(Debug, Clone, Default)]
pub struct QuotationQuery {
    pub client_id: Option<ClientId>,
    pub status: Option<QuotationStatus>,
}

impl QuotationQuery {
    pub fn by_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, document: &QuotationDocument) -> bool {
        if let Some(client_id) = self.client_id {
            if document.client_id != Some(client_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if document.status != status {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait QuotationPort: DomainPort {
    async fn get_quotation(
        &self,
        id: QuotationId,
        metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDocument, PortError>;

    /// Quotations matching the query, newest quotation date first
    async fn find_quotations(
        &self,
        query: QuotationQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<QuotationDocument>, PortError>;

    /// Line items ordered by `display_order`
    async fn list_line_items(
        &self,
        quotation_id: QuotationId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<QuotationLineItem>, PortError>;

    /// Upserts the document and replaces all of its line items atomically
    async fn save_quotation(
        &self,
        document: &QuotationDocument,
        items: &[QuotationLineItem],
        metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDocument, PortError>;

    async fn update_status(
        &self,
        id: QuotationId,
        status: QuotationStatus,
        metadata: Option<OperationMetadata>,
    ) -> Result<QuotationDocument, PortError>;
}

/// Assigns human-readable quotation numbers
#[async_trait]
pub trait QuotationNumberSequence: DomainPort {
    async fn next_number(&self, metadata: Option<OperationMetadata>) -> Result<String, PortError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory quotation store
    ///
    /// `fail_item_writes` rejects a save at the item-replacement step, after
    /// which the previously stored document and items must still be intact.
    #[derive(Debug, Default)]
    pub struct MockQuotationPort {
        documents: Arc<RwLock<HashMap<QuotationId, QuotationDocument>>>,
        items: Arc<RwLock<HashMap<QuotationId, Vec<QuotationLineItem>>>>,
        fail_writes: AtomicBool,
        fail_item_writes: AtomicBool,
    }

    impl MockQuotationPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_item_writes(&self, fail: bool) {
            self.fail_item_writes.store(fail, Ordering::SeqCst);
        }

        pub async fn stored_items(&self, id: QuotationId) -> Vec<QuotationLineItem> {
            self.items.read().await.get(&id).cloned().unwrap_or_default()
        }

        pub async fn stored_document(&self, id: QuotationId) -> Option<QuotationDocument> {
            self.documents.read().await.get(&id).cloned()
        }
    }

    impl DomainPort for MockQuotationPort {}

    #[async_trait]
    impl QuotationPort for MockQuotationPort {
        async fn get_quotation(
            &self,
            id: QuotationId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<QuotationDocument, PortError> {
            self.documents
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Quotation", id))
        }

        async fn find_quotations(
            &self,
            query: QuotationQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<QuotationDocument>, PortError> {
            let documents = self.documents.read().await;
            let mut results: Vec<QuotationDocument> =
                documents.values().filter(|d| query.matches(d)).cloned().collect();
            results.sort_by(|a, b| b.quotation_date.cmp(&a.quotation_date));
            Ok(results)
        }

        async fn list_line_items(
            &self,
            quotation_id: QuotationId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<QuotationLineItem>, PortError> {
            let mut items = self.stored_items(quotation_id).await;
            items.sort_by_key(|item| item.display_order);
            Ok(items)
        }

        async fn save_quotation(
            &self,
            document: &QuotationDocument,
            items: &[QuotationLineItem],
            _metadata: Option<OperationMetadata>,
        ) -> Result<QuotationDocument, PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::connection("injected write failure"));
            }

            let mut documents = self.documents.write().await;
            let mut stored_items = self.items.write().await;
            if self.fail_item_writes.load(Ordering::SeqCst) {
                return Err(PortError::internal("injected line item failure"));
            }

            let mut saved = document.clone();
            saved.updated_at = Utc::now();
            documents.insert(saved.id, saved.clone());
            stored_items.insert(saved.id, items.to_vec());
            Ok(saved)
        }

        async fn update_status(
            &self,
            id: QuotationId,
            status: QuotationStatus,
            _metadata: Option<OperationMetadata>,
        ) -> Result<QuotationDocument, PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::connection("injected write failure"));
            }
            let mut documents = self.documents.write().await;
            let document = documents
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Quotation", id))?;
            document.status = status;
            document.updated_at = Utc::now();
            Ok(document.clone())
        }
    }

    /// Counter-backed number sequence
    #[derive(Debug, Default)]
    pub struct MockNumberSequence {
        counter: AtomicU64,
    }

    impl MockNumberSequence {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn issued(&self) -> u64 {
            self.counter.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for MockNumberSequence {}

    #[async_trait]
    impl QuotationNumberSequence for MockNumberSequence {
        async fn next_number(&self, _metadata: Option<OperationMetadata>) -> Result<String, PortError> {
            let value = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format_quotation_number(QUOTATION_NUMBER_PREFIX, value))
        }
    }

}
