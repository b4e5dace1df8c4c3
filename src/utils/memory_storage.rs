//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::reconciliation::Reconciliation;
use crate::status::{PaymentStatus, PaymentStatusHistory, PaymentStatusRecord};
use crate::traits::*;
use crate::types::{BankTransaction, BillingMonth, BillingSummary, EngineResult};

/// In-memory implementation of every collaborator contract, for testing
/// and development. Clones share the same underlying data.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    summaries: Arc<RwLock<HashMap<String, BillingSummary>>>,
    transactions: Arc<RwLock<Vec<BankTransaction>>>,
    status_records: Arc<RwLock<HashMap<String, Vec<PaymentStatusRecord>>>>,
    reconciliations: Arc<RwLock<HashMap<(String, BillingMonth), Reconciliation>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            summaries: Arc::new(RwLock::new(HashMap::new())),
            transactions: Arc::new(RwLock::new(Vec::new())),
            status_records: Arc::new(RwLock::new(HashMap::new())),
            reconciliations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a billing summary
    pub fn insert_summary(&self, summary: BillingSummary) {
        self.summaries
            .write()
            .unwrap()
            .insert(summary.id.clone(), summary);
    }

    /// Seed a bank transaction
    pub fn insert_transaction(&self, transaction: BankTransaction) {
        self.transactions.write().unwrap().push(transaction);
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.summaries.write().unwrap().clear();
        self.transactions.write().unwrap().clear();
        self.status_records.write().unwrap().clear();
        self.reconciliations.write().unwrap().clear();
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillingSummaryStore for MemoryStorage {
    async fn find_by_card_and_month(
        &self,
        card_id: &str,
        billing_month: &BillingMonth,
    ) -> EngineResult<Option<BillingSummary>> {
        Ok(self
            .summaries
            .read()
            .unwrap()
            .values()
            .find(|summary| {
                summary.card_id == card_id && summary.billing_month == *billing_month
            })
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> EngineResult<Vec<BillingSummary>> {
        let summaries = self.summaries.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| summaries.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl BankTransactionSource for MemoryStorage {
    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<BankTransaction>> {
        Ok(self
            .transactions
            .read()
            .unwrap()
            .iter()
            .filter(|tx| tx.date >= start && tx.date <= end)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentStatusStore for MemoryStorage {
    async fn find_by_card_summary_id(
        &self,
        card_summary_id: &str,
    ) -> EngineResult<Option<PaymentStatusRecord>> {
        Ok(self
            .status_records
            .read()
            .unwrap()
            .get(card_summary_id)
            .and_then(|records| records.last())
            .cloned())
    }

    async fn find_all_by_status(
        &self,
        status: PaymentStatus,
    ) -> EngineResult<Vec<PaymentStatusRecord>> {
        Ok(self
            .status_records
            .read()
            .unwrap()
            .values()
            .filter_map(|records| records.last())
            .filter(|record| record.status == status)
            .cloned()
            .collect())
    }

    async fn save(&self, record: &PaymentStatusRecord) -> EngineResult<PaymentStatusRecord> {
        self.status_records
            .write()
            .unwrap()
            .entry(record.card_summary_id.clone())
            .or_default()
            .push(record.clone());
        Ok(record.clone())
    }

    async fn find_history_by_card_summary_id(
        &self,
        card_summary_id: &str,
    ) -> EngineResult<PaymentStatusHistory> {
        let records = self
            .status_records
            .read()
            .unwrap()
            .get(card_summary_id)
            .cloned()
            .unwrap_or_default();
        PaymentStatusHistory::new(card_summary_id.to_string(), records)
    }
}

#[async_trait]
impl ReconciliationStore for MemoryStorage {
    async fn find_by_card_and_month(
        &self,
        card_id: &str,
        billing_month: &BillingMonth,
    ) -> EngineResult<Option<Reconciliation>> {
        Ok(self
            .reconciliations
            .read()
            .unwrap()
            .get(&(card_id.to_string(), *billing_month))
            .cloned())
    }

    async fn save(&self, reconciliation: &Reconciliation) -> EngineResult<Reconciliation> {
        let key = (
            reconciliation.card_id.clone(),
            reconciliation.billing_month,
        );
        let mut reconciliations = self.reconciliations.write().unwrap();

        let mut stored = reconciliation.clone();
        if let Some(existing) = reconciliations.get(&key) {
            stored.id = existing.id;
            stored.created_at = existing.created_at;
        }
        reconciliations.insert(key, stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::TransitionDetails;
    use crate::types::UpdatedBy;

    #[tokio::test]
    async fn status_listing_considers_only_the_current_record() {
        let storage = MemoryStorage::new();
        let first = PaymentStatusRecord::initial("sum-1".to_string());
        PaymentStatusStore::save(&storage, &first).await.unwrap();
        let second = first
            .transition_to(
                PaymentStatus::Processing,
                UpdatedBy::System,
                TransitionDetails::default(),
            )
            .unwrap();
        PaymentStatusStore::save(&storage, &second).await.unwrap();

        let pending = storage
            .find_all_by_status(PaymentStatus::Pending)
            .await
            .unwrap();
        assert!(pending.is_empty());

        let processing = storage
            .find_all_by_status(PaymentStatus::Processing)
            .await
            .unwrap();
        assert_eq!(processing.len(), 1);
        assert_eq!(processing[0].id, second.id);
    }

    #[tokio::test]
    async fn clones_share_the_same_data() {
        let storage = MemoryStorage::new();
        let clone = storage.clone();
        PaymentStatusStore::save(&clone, &PaymentStatusRecord::initial("sum-1".to_string()))
            .await
            .unwrap();

        let seen = storage.find_by_card_summary_id("sum-1").await.unwrap();
        assert!(seen.is_some());
    }
}
