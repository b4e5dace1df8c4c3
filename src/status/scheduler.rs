//! Daily batch passes advancing payment status by elapsed time
//!
//! The scheduler never inspects bank data; it moves records forward
//! purely as a function of "today" against each summary's payment date.
//! An external job runner triggers [`PaymentStatusScheduler::run_daily`]
//! once per day. Records that fail to advance are logged and retried on
//! the next day's run; there is no in-run retry.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::warn;

use crate::status::{PaymentStatus, TransitionDetails};
use crate::traits::{BillingSummaryStore, PaymentStatusStore};
use crate::types::{EngineResult, UpdatedBy};

/// Calendar days before the payment date at which PENDING becomes
/// PROCESSING
pub const PROCESSING_LEAD_DAYS: i64 = 3;

/// Calendar days past the payment date after which PROCESSING becomes
/// OVERDUE
pub const OVERDUE_GRACE_DAYS: i64 = 7;

/// Accounting for one scheduler pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassOutcome {
    /// Transitions that were applied and saved
    pub success_count: usize,
    /// Transitions that failed; logged and left for tomorrow's run
    pub failure_count: usize,
    /// Status records found in the pass's source state
    pub total_candidates: usize,
}

/// Aggregate result of one daily run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRunReport {
    /// When the run started
    pub started_at: NaiveDateTime,
    /// Wall-clock duration of both passes
    pub duration_ms: u64,
    /// Outcome of the PENDING -> PROCESSING pass
    pub pending_to_processing: PassOutcome,
    /// Outcome of the PROCESSING -> OVERDUE pass
    pub processing_to_overdue: PassOutcome,
}

/// The daily status batch.
///
/// Each pass does one bulk listing, one bulk summary lookup, then fans
/// out the eligible transitions concurrently. Per-record failures are
/// isolated: every update settles before any outcome is inspected, and
/// one failure never rolls back or cancels a sibling.
pub struct PaymentStatusScheduler<B, S> {
    summaries: B,
    statuses: S,
}

impl<B, S> PaymentStatusScheduler<B, S>
where
    B: BillingSummaryStore,
    S: PaymentStatusStore,
{
    /// Create a scheduler over the given stores
    pub fn new(summaries: B, statuses: S) -> Self {
        Self { summaries, statuses }
    }

    /// Move PENDING payments to PROCESSING once `today` is within three
    /// calendar days of the payment date
    pub async fn advance_pending(&self, today: NaiveDate) -> EngineResult<PassOutcome> {
        self.run_pass(
            PaymentStatus::Pending,
            PaymentStatus::Processing,
            "3 days before payment date",
            today,
            |payment_date, today| today >= payment_date - Duration::days(PROCESSING_LEAD_DAYS),
        )
        .await
    }

    /// Move PROCESSING payments to OVERDUE once `today` is strictly past
    /// the payment date plus the grace period
    pub async fn flag_overdue(&self, today: NaiveDate) -> EngineResult<PassOutcome> {
        self.run_pass(
            PaymentStatus::Processing,
            PaymentStatus::Overdue,
            "7 days past payment date",
            today,
            |payment_date, today| today > payment_date + Duration::days(OVERDUE_GRACE_DAYS),
        )
        .await
    }

    /// Run both passes sequentially. Listing failures propagate;
    /// per-record failures are absorbed into the pass outcomes.
    pub async fn run_daily(&self, now: NaiveDateTime) -> EngineResult<DailyRunReport> {
        let clock = Instant::now();
        let today = now.date();

        let pending_to_processing = self.advance_pending(today).await?;
        let processing_to_overdue = self.flag_overdue(today).await?;

        Ok(DailyRunReport {
            started_at: now,
            duration_ms: clock.elapsed().as_millis() as u64,
            pending_to_processing,
            processing_to_overdue,
        })
    }

    async fn run_pass(
        &self,
        source: PaymentStatus,
        target: PaymentStatus,
        reason: &str,
        today: NaiveDate,
        eligible: impl Fn(NaiveDate, NaiveDate) -> bool,
    ) -> EngineResult<PassOutcome> {
        let records = self.statuses.find_all_by_status(source).await?;
        let total_candidates = records.len();
        if records.is_empty() {
            return Ok(PassOutcome {
                total_candidates,
                ..PassOutcome::default()
            });
        }

        let ids: Vec<String> = records
            .iter()
            .map(|record| record.card_summary_id.clone())
            .collect();
        let summaries = self.summaries.find_by_ids(&ids).await?;
        let by_id: HashMap<&str, _> = summaries
            .iter()
            .map(|summary| (summary.id.as_str(), summary))
            .collect();

        let mut updates = Vec::new();
        for record in &records {
            let Some(summary) = by_id.get(record.card_summary_id.as_str()) else {
                warn!(
                    card_summary_id = %record.card_summary_id,
                    "billing summary missing, skipping status record"
                );
                continue;
            };
            if !eligible(summary.payment_date, today) {
                continue;
            }
            updates.push(async move {
                let outcome = async {
                    let next = record.transition_to(
                        target,
                        UpdatedBy::System,
                        TransitionDetails::with_reason(reason),
                    )?;
                    self.statuses.save(&next).await
                }
                .await;
                (record.card_summary_id.as_str(), outcome)
            });
        }

        // settle everything before inspecting any outcome
        let settled = join_all(updates).await;

        let mut success_count = 0;
        let mut failure_count = 0;
        for (card_summary_id, outcome) in settled {
            match outcome {
                Ok(_) => success_count += 1,
                Err(error) => {
                    failure_count += 1;
                    warn!(
                        card_summary_id,
                        %error,
                        "status transition failed, leaving record for the next run"
                    );
                }
            }
        }

        Ok(PassOutcome {
            success_count,
            failure_count,
            total_candidates,
        })
    }
}
