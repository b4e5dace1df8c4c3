//! Reconciliation aggregate and orchestrating engine

pub mod engine;

pub use engine::*;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::matching::{ReconciliationResult, CONFIDENCE_FULL, CONFIDENCE_PARTIAL};
use crate::types::BillingMonth;

/// Overall outcome of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStatus {
    /// A bank debit was identified as the card payment
    Matched,
    /// No candidate matched the payment amount
    Unmatched,
    /// Amount and date lined up but the description did not
    Partial,
    /// Recorded but not yet executed
    Pending,
}

impl ReconciliationStatus {
    /// Wire representation, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationStatus::Matched => "MATCHED",
            ReconciliationStatus::Unmatched => "UNMATCHED",
            ReconciliationStatus::Partial => "PARTIAL",
            ReconciliationStatus::Pending => "PENDING",
        }
    }

    /// The status a single match result implies
    pub fn from_confidence(confidence: u8) -> Self {
        match confidence {
            CONFIDENCE_FULL => ReconciliationStatus::Matched,
            CONFIDENCE_PARTIAL => ReconciliationStatus::Partial,
            _ => ReconciliationStatus::Unmatched,
        }
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-outcome tallies over a run's results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub partial: usize,
}

impl ReconciliationSummary {
    /// Tally a set of match results
    pub fn tally(results: &[ReconciliationResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match ReconciliationStatus::from_confidence(result.confidence) {
                ReconciliationStatus::Matched => summary.matched += 1,
                ReconciliationStatus::Partial => summary.partial += 1,
                _ => summary.unmatched += 1,
            }
        }
        summary
    }
}

/// The recorded outcome of reconciling one card's billing month.
///
/// One aggregate exists per `card_id` + `billing_month`; re-running the
/// reconciliation overwrites it (the store preserves `id` and
/// `created_at`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Unique identifier of the aggregate
    pub id: Uuid,
    /// The reconciled card
    pub card_id: String,
    /// The reconciled billing month
    pub billing_month: BillingMonth,
    /// Overall outcome
    pub status: ReconciliationStatus,
    /// When the matching ran
    pub executed_at: NaiveDateTime,
    /// Individual match results
    pub results: Vec<ReconciliationResult>,
    /// Tallies over `results`
    pub summary: ReconciliationSummary,
    /// When the aggregate was first recorded
    pub created_at: NaiveDateTime,
    /// When the aggregate was last written
    pub updated_at: NaiveDateTime,
}

impl Reconciliation {
    /// Build the aggregate for a completed run over one billing summary
    pub fn from_result(
        card_id: String,
        billing_month: BillingMonth,
        result: ReconciliationResult,
        executed_at: NaiveDateTime,
    ) -> Self {
        let status = ReconciliationStatus::from_confidence(result.confidence);
        let results = vec![result];
        let summary = ReconciliationSummary::tally(&results);
        Self {
            id: Uuid::new_v4(),
            card_id,
            billing_month,
            status,
            executed_at,
            results,
            summary,
            created_at: executed_at,
            updated_at: executed_at,
        }
    }
}
