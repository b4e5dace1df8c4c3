//! Orchestration of a reconciliation run
//!
//! The engine wires the injected stores to the pure matcher: fetch the
//! billing summary, fetch the bank transactions around its payment date,
//! match, and persist the aggregate. It holds no state of its own beyond
//! the matcher configuration.

use chrono::NaiveDateTime;
use tracing::info;

use crate::matching::ReconciliationMatcher;
use crate::reconciliation::Reconciliation;
use crate::traits::{BankTransactionSource, BillingSummaryStore, ReconciliationStore};
use crate::types::{BillingMonth, EngineError, EngineResult};

/// Runs reconciliations over injected collaborators
pub struct ReconciliationEngine<B, T, R> {
    summaries: B,
    transactions: T,
    reconciliations: R,
    matcher: ReconciliationMatcher,
}

impl<B, T, R> ReconciliationEngine<B, T, R>
where
    B: BillingSummaryStore,
    T: BankTransactionSource,
    R: ReconciliationStore,
{
    /// Create an engine with the default matcher configuration
    pub fn new(summaries: B, transactions: T, reconciliations: R) -> Self {
        Self {
            summaries,
            transactions,
            reconciliations,
            matcher: ReconciliationMatcher::default(),
        }
    }

    /// Create an engine with a custom matcher
    pub fn with_matcher(
        summaries: B,
        transactions: T,
        reconciliations: R,
        matcher: ReconciliationMatcher,
    ) -> Self {
        Self {
            summaries,
            transactions,
            reconciliations,
            matcher,
        }
    }

    /// Reconcile one card's billing month as of `now`.
    ///
    /// Fails when the summary is absent, when its payment date is still
    /// in the future (reconciliation runs in arrears), or when the
    /// matcher finds an unresolvable ambiguity. On success the stored
    /// aggregate is returned; re-running overwrites the previous run's
    /// aggregate while keeping its identity.
    pub async fn reconcile(
        &self,
        card_id: &str,
        billing_month: &BillingMonth,
        now: NaiveDateTime,
    ) -> EngineResult<Reconciliation> {
        let summary = self
            .summaries
            .find_by_card_and_month(card_id, billing_month)
            .await?
            .ok_or_else(|| EngineError::SummaryNotFound {
                card_id: card_id.to_string(),
                billing_month: *billing_month,
            })?;

        if summary.payment_date > now.date() {
            return Err(EngineError::PaymentDateInFuture {
                payment_date: summary.payment_date,
            });
        }

        let (window_start, window_end) = self.matcher.search_window(summary.payment_date);
        let candidates = self
            .transactions
            .find_by_date_range(window_start, window_end)
            .await?;

        let result = self.matcher.match_summary(&summary, &candidates)?;
        info!(
            card_id,
            billing_month = %billing_month,
            confidence = result.confidence,
            "reconciliation executed"
        );

        let aggregate =
            Reconciliation::from_result(card_id.to_string(), *billing_month, result, now);
        self.reconciliations.save(&aggregate).await
    }

    /// The recorded aggregate for one card and billing month, if any
    pub async fn find(
        &self,
        card_id: &str,
        billing_month: &BillingMonth,
    ) -> EngineResult<Option<Reconciliation>> {
        self.reconciliations
            .find_by_card_and_month(card_id, billing_month)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::ReconciliationStatus;
    use crate::types::{BankTransaction, BillingSummary};
    use crate::utils::memory_storage::MemoryStorage;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn month() -> BillingMonth {
        BillingMonth::new(2025, 1).unwrap()
    }

    fn seeded_storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.insert_summary(
            BillingSummary::new(
                "sum-1".to_string(),
                "card-1".to_string(),
                "楽天カード".to_string(),
                month(),
                date(2025, 1, 31),
                date(2025, 2, 27),
                54320,
                vec!["t1".to_string()],
            )
            .unwrap(),
        );
        storage
    }

    fn now() -> NaiveDateTime {
        date(2025, 3, 3).and_hms_opt(6, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn reconcile_records_a_matched_aggregate() {
        let storage = seeded_storage();
        storage.insert_transaction(
            BankTransaction::new(
                "bank-1".to_string(),
                date(2025, 2, 27),
                54320,
                "ラクテンカードサービス".to_string(),
            )
            .unwrap(),
        );
        let engine =
            ReconciliationEngine::new(storage.clone(), storage.clone(), storage.clone());

        let aggregate = engine.reconcile("card-1", &month(), now()).await.unwrap();

        assert_eq!(aggregate.status, ReconciliationStatus::Matched);
        assert_eq!(aggregate.summary.total, 1);
        assert_eq!(aggregate.summary.matched, 1);
        assert_eq!(aggregate.results.len(), 1);
        assert!(aggregate.results[0].is_matched);

        let stored = engine.find("card-1", &month()).await.unwrap().unwrap();
        assert_eq!(stored, aggregate);
    }

    #[tokio::test]
    async fn reconcile_fails_for_unknown_summary() {
        let storage = MemoryStorage::new();
        let engine =
            ReconciliationEngine::new(storage.clone(), storage.clone(), storage.clone());

        let error = engine
            .reconcile("card-1", &month(), now())
            .await
            .unwrap_err();
        assert!(matches!(error, EngineError::SummaryNotFound { .. }));
    }

    #[tokio::test]
    async fn reconcile_rejects_future_payment_dates() {
        let storage = seeded_storage();
        let engine =
            ReconciliationEngine::new(storage.clone(), storage.clone(), storage.clone());

        // the payment date is 2025-02-27; run "today" on the 20th
        let early = date(2025, 2, 20).and_hms_opt(6, 0, 0).unwrap();
        let error = engine
            .reconcile("card-1", &month(), early)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            EngineError::PaymentDateInFuture { payment_date } if payment_date == date(2025, 2, 27)
        ));
    }

    #[tokio::test]
    async fn rerunning_preserves_aggregate_identity() {
        let storage = seeded_storage();
        let engine =
            ReconciliationEngine::new(storage.clone(), storage.clone(), storage.clone());

        let first = engine.reconcile("card-1", &month(), now()).await.unwrap();
        assert_eq!(first.status, ReconciliationStatus::Unmatched);

        // the missing debit shows up before the second run
        storage.insert_transaction(
            BankTransaction::new(
                "bank-1".to_string(),
                date(2025, 2, 27),
                54320,
                "ラクテンカードサービス".to_string(),
            )
            .unwrap(),
        );
        let later = date(2025, 3, 4).and_hms_opt(6, 0, 0).unwrap();
        let second = engine.reconcile("card-1", &month(), later).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.status, ReconciliationStatus::Matched);
        assert_eq!(second.updated_at, later);
    }

    #[tokio::test]
    async fn ambiguity_propagates_to_the_caller() {
        let storage = seeded_storage();
        for (id, day) in [("bank-1", 26), ("bank-2", 28)] {
            storage.insert_transaction(
                BankTransaction::new(
                    id.to_string(),
                    date(2025, 2, day),
                    54320,
                    "フリコミ".to_string(),
                )
                .unwrap(),
            );
        }
        let engine =
            ReconciliationEngine::new(storage.clone(), storage.clone(), storage.clone());

        let error = engine
            .reconcile("card-1", &month(), now())
            .await
            .unwrap_err();
        assert!(matches!(error, EngineError::AmbiguousMatch { .. }));
        // nothing was recorded
        assert!(engine.find("card-1", &month()).await.unwrap().is_none());
    }
}
