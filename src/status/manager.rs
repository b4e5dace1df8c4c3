//! Manual and reconciliation-driven status updates

use crate::status::{
    PaymentStatus, PaymentStatusHistory, PaymentStatusRecord, TransitionDetails,
};
use crate::traits::PaymentStatusStore;
use crate::types::{EngineError, EngineResult, UpdatedBy};

/// Entry point for status changes made outside the daily batch: operator
/// decisions and reconciliation follow-ups
pub struct PaymentStatusManager<S: PaymentStatusStore> {
    store: S,
}

impl<S: PaymentStatusStore> PaymentStatusManager<S> {
    /// Create a manager over the given status store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Start tracking a billing summary's payment.
    ///
    /// Creates the initial PENDING record, or returns the existing
    /// current record when tracking already started.
    pub async fn initialize(&self, card_summary_id: &str) -> EngineResult<PaymentStatusRecord> {
        if let Some(existing) = self.store.find_by_card_summary_id(card_summary_id).await? {
            return Ok(existing);
        }
        let record = PaymentStatusRecord::initial(card_summary_id.to_string());
        self.store.save(&record).await
    }

    /// Apply a validated transition to the current record and append the
    /// successor
    pub async fn update_status(
        &self,
        card_summary_id: &str,
        target: PaymentStatus,
        updated_by: UpdatedBy,
        details: TransitionDetails,
    ) -> EngineResult<PaymentStatusRecord> {
        let current = self
            .store
            .find_by_card_summary_id(card_summary_id)
            .await?
            .ok_or_else(|| EngineError::StatusNotFound(card_summary_id.to_string()))?;

        let next = current.transition_to(target, updated_by, details)?;
        self.store.save(&next).await
    }

    /// The current record for a billing summary
    pub async fn current(
        &self,
        card_summary_id: &str,
    ) -> EngineResult<Option<PaymentStatusRecord>> {
        self.store.find_by_card_summary_id(card_summary_id).await
    }

    /// The full status history for a billing summary
    pub async fn history(&self, card_summary_id: &str) -> EngineResult<PaymentStatusHistory> {
        self.store
            .find_history_by_card_summary_id(card_summary_id)
            .await
    }
}
