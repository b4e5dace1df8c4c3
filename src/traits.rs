//! Traits for the injected collaborator contracts
//!
//! The core never talks to a concrete backend. Billing summaries, bank
//! transactions, status records and reconciliation aggregates all arrive
//! through these traits, so any transport (database, REST client,
//! file-backed store, in-memory double) can sit behind them. Methods take
//! `&self`: implementations are shared handles with their own interior
//! synchronization, which lets the scheduler fan out concurrent
//! per-record writes.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::reconciliation::Reconciliation;
use crate::status::{PaymentStatus, PaymentStatusHistory, PaymentStatusRecord};
use crate::types::{BankTransaction, BillingMonth, BillingSummary, EngineResult};

/// Read access to upstream billing summaries
#[async_trait]
pub trait BillingSummaryStore: Send + Sync {
    /// The summary for one card and billing month, if produced
    async fn find_by_card_and_month(
        &self,
        card_id: &str,
        billing_month: &BillingMonth,
    ) -> EngineResult<Option<BillingSummary>>;

    /// Bulk lookup by summary id; used by the scheduler to avoid one
    /// query per status record. Unknown ids are silently absent from the
    /// result.
    async fn find_by_ids(&self, ids: &[String]) -> EngineResult<Vec<BillingSummary>>;
}

/// Read access to externally observed bank transactions
#[async_trait]
pub trait BankTransactionSource: Send + Sync {
    /// All transactions posted in the inclusive date range
    async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<BankTransaction>>;
}

/// Append-only store of payment status records
#[async_trait]
pub trait PaymentStatusStore: Send + Sync {
    /// The current (most recent) record for a billing summary
    async fn find_by_card_summary_id(
        &self,
        card_summary_id: &str,
    ) -> EngineResult<Option<PaymentStatusRecord>>;

    /// Every billing summary whose current record is in `status`
    async fn find_all_by_status(
        &self,
        status: PaymentStatus,
    ) -> EngineResult<Vec<PaymentStatusRecord>>;

    /// Append a record. Keyed by record id; prior records for the same
    /// billing summary are never touched.
    async fn save(&self, record: &PaymentStatusRecord) -> EngineResult<PaymentStatusRecord>;

    /// The full status history of a billing summary, oldest first
    async fn find_history_by_card_summary_id(
        &self,
        card_summary_id: &str,
    ) -> EngineResult<PaymentStatusHistory>;
}

/// Store of reconciliation aggregates, one per card and billing month
#[async_trait]
pub trait ReconciliationStore: Send + Sync {
    /// The aggregate for one card and billing month, if any run recorded
    /// one
    async fn find_by_card_and_month(
        &self,
        card_id: &str,
        billing_month: &BillingMonth,
    ) -> EngineResult<Option<Reconciliation>>;

    /// Upsert keyed by card id and billing month. When a row already
    /// exists its original `id` and `created_at` are preserved;
    /// everything else is overwritten (last write wins). Returns the row
    /// as stored.
    async fn save(&self, reconciliation: &Reconciliation) -> EngineResult<Reconciliation>;
}
