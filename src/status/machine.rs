//! Payment status state machine with append-only history
//!
//! A status change never mutates an existing record; a validated
//! transition produces a brand-new [`PaymentStatusRecord`] linked to its
//! predecessors only through the shared `card_summary_id`. The full chain
//! for one summary is a [`PaymentStatusHistory`].

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::{EngineError, EngineResult, UpdatedBy};

/// Lifecycle status of a card payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Awaiting the payment date
    Pending,
    /// Payment date is near or has arrived; debit expected
    Processing,
    /// Debit confirmed
    Paid,
    /// No debit observed well past the payment date
    Overdue,
    /// Only part of the expected amount was debited
    Partial,
    /// Flagged for investigation
    Disputed,
    /// Billing cancelled before payment
    Cancelled,
    /// Confirmed by an operator outside the automatic flow
    ManualConfirmed,
}

impl PaymentStatus {
    /// Statuses this one may transition to. Empty for terminal statuses.
    pub fn allowed_transitions(&self) -> &'static [PaymentStatus] {
        match self {
            PaymentStatus::Pending => &[
                PaymentStatus::Processing,
                PaymentStatus::Partial,
                PaymentStatus::Cancelled,
                PaymentStatus::ManualConfirmed,
            ],
            PaymentStatus::Processing => &[
                PaymentStatus::Paid,
                PaymentStatus::Disputed,
                PaymentStatus::Overdue,
            ],
            PaymentStatus::Disputed => &[PaymentStatus::ManualConfirmed],
            PaymentStatus::Paid
            | PaymentStatus::Overdue
            | PaymentStatus::Partial
            | PaymentStatus::Cancelled
            | PaymentStatus::ManualConfirmed => &[],
        }
    }

    /// Whether no further transitions are allowed
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Whether a transition to `target` is allowed. Self-transitions and
    /// anything out of a terminal status are not.
    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        if *self == target {
            return false;
        }
        self.allowed_transitions().contains(&target)
    }

    /// Wire representation, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Overdue => "OVERDUE",
            PaymentStatus::Partial => "PARTIAL",
            PaymentStatus::Disputed => "DISPUTED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::ManualConfirmed => "MANUAL_CONFIRMED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional metadata attached to a status transition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDetails {
    /// Why the transition happened
    pub reason: Option<String>,
    /// Free-form operator notes
    pub notes: Option<String>,
    /// The reconciliation run that drove the transition, if any
    pub reconciliation_id: Option<Uuid>,
}

impl TransitionDetails {
    /// Details carrying only a reason
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// One immutable entry in a payment's status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusRecord {
    /// Unique identifier of this record
    pub id: Uuid,
    /// The billing summary whose payment this tracks
    pub card_summary_id: String,
    /// Status after the change
    pub status: PaymentStatus,
    /// Status before the change; absent on the first record
    pub previous_status: Option<PaymentStatus>,
    /// When the change was made
    pub updated_at: NaiveDateTime,
    /// Who made the change
    pub updated_by: UpdatedBy,
    /// Why the change was made
    pub reason: Option<String>,
    /// Reconciliation run that drove the change, if any
    pub reconciliation_id: Option<Uuid>,
    /// Free-form operator notes
    pub notes: Option<String>,
    /// When this record was created
    pub created_at: NaiveDateTime,
}

impl PaymentStatusRecord {
    /// The first record for a billing summary: PENDING, system-created
    pub fn initial(card_summary_id: String) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            card_summary_id,
            status: PaymentStatus::Pending,
            previous_status: None,
            updated_at: now,
            updated_by: UpdatedBy::System,
            reason: None,
            reconciliation_id: None,
            notes: None,
            created_at: now,
        }
    }

    /// Produce the successor record for a validated transition.
    ///
    /// The current record is left untouched; an invalid edge yields
    /// [`EngineError::InvalidTransition`] and no record at all.
    pub fn transition_to(
        &self,
        target: PaymentStatus,
        updated_by: UpdatedBy,
        details: TransitionDetails,
    ) -> EngineResult<PaymentStatusRecord> {
        if !self.status.can_transition_to(target) {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }

        let now = Utc::now().naive_utc();
        Ok(PaymentStatusRecord {
            id: Uuid::new_v4(),
            card_summary_id: self.card_summary_id.clone(),
            status: target,
            previous_status: Some(self.status),
            updated_at: now,
            updated_by,
            reason: details.reason,
            reconciliation_id: details.reconciliation_id,
            notes: details.notes,
            created_at: now,
        })
    }
}

/// Chronological status history of one billing summary's payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusHistory {
    card_summary_id: String,
    records: Vec<PaymentStatusRecord>,
}

impl PaymentStatusHistory {
    /// Assemble a history, validating that every record belongs to
    /// `card_summary_id`. Records are ordered chronologically ascending.
    pub fn new(
        card_summary_id: String,
        mut records: Vec<PaymentStatusRecord>,
    ) -> EngineResult<Self> {
        if let Some(stray) = records
            .iter()
            .find(|record| record.card_summary_id != card_summary_id)
        {
            return Err(EngineError::Validation(format!(
                "History for '{}' cannot include record {} belonging to '{}'",
                card_summary_id, stray.id, stray.card_summary_id
            )));
        }
        records.sort_by_key(|record| record.updated_at);
        Ok(Self {
            card_summary_id,
            records,
        })
    }

    /// The billing summary this history belongs to
    pub fn card_summary_id(&self) -> &str {
        &self.card_summary_id
    }

    /// All records, oldest first
    pub fn records(&self) -> &[PaymentStatusRecord] {
        &self.records
    }

    /// The most recent record; an empty history is an error
    pub fn latest_status(&self) -> EngineResult<&PaymentStatusRecord> {
        self.records
            .last()
            .ok_or_else(|| EngineError::StatusNotFound(self.card_summary_id.clone()))
    }

    /// The status in effect at `at`: the most recent record whose
    /// `updated_at` does not postdate it, or `None` when every record does
    pub fn status_at(&self, at: NaiveDateTime) -> Option<&PaymentStatusRecord> {
        self.records
            .iter()
            .rev()
            .find(|record| record.updated_at <= at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn pending_allows_only_its_table_targets() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Processing));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Partial));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Cancelled));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::ManualConfirmed));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Overdue));
    }

    #[test]
    fn self_transitions_are_rejected() {
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Processing.can_transition_to(PaymentStatus::Processing));
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for status in [
            PaymentStatus::Paid,
            PaymentStatus::Overdue,
            PaymentStatus::Partial,
            PaymentStatus::Cancelled,
            PaymentStatus::ManualConfirmed,
        ] {
            assert!(status.is_terminal());
            assert!(status.allowed_transitions().is_empty());
        }
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(!PaymentStatus::Processing.is_terminal());
        assert!(!PaymentStatus::Disputed.is_terminal());
    }

    #[test]
    fn disputed_resolves_only_to_manual_confirmation() {
        assert_eq!(
            PaymentStatus::Disputed.allowed_transitions(),
            &[PaymentStatus::ManualConfirmed]
        );
    }

    #[test]
    fn initial_record_is_pending_and_system_made() {
        let record = PaymentStatusRecord::initial("sum-1".to_string());
        assert_eq!(record.status, PaymentStatus::Pending);
        assert_eq!(record.previous_status, None);
        assert_eq!(record.updated_by, UpdatedBy::System);
    }

    #[test]
    fn transition_produces_a_linked_successor() {
        let first = PaymentStatusRecord::initial("sum-1".to_string());
        let second = first
            .transition_to(
                PaymentStatus::Processing,
                UpdatedBy::System,
                TransitionDetails::with_reason("3 days before payment date"),
            )
            .unwrap();

        assert_eq!(second.status, PaymentStatus::Processing);
        assert_eq!(second.previous_status, Some(PaymentStatus::Pending));
        assert_eq!(second.card_summary_id, first.card_summary_id);
        assert_ne!(second.id, first.id);
        assert_eq!(second.reason.as_deref(), Some("3 days before payment date"));
        // the original record is untouched
        assert_eq!(first.status, PaymentStatus::Pending);
    }

    #[test]
    fn invalid_transition_yields_no_record() {
        let record = PaymentStatusRecord::initial("sum-1".to_string());
        let error = record
            .transition_to(
                PaymentStatus::Paid,
                UpdatedBy::User,
                TransitionDetails::default(),
            )
            .unwrap_err();
        assert!(matches!(
            error,
            EngineError::InvalidTransition {
                from: PaymentStatus::Pending,
                to: PaymentStatus::Paid,
            }
        ));
    }

    #[test]
    fn history_rejects_records_from_other_summaries() {
        let ours = PaymentStatusRecord::initial("sum-1".to_string());
        let theirs = PaymentStatusRecord::initial("sum-2".to_string());
        let result = PaymentStatusHistory::new("sum-1".to_string(), vec![ours, theirs]);
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn history_orders_records_chronologically() {
        let mut first = PaymentStatusRecord::initial("sum-1".to_string());
        first.updated_at = timestamp(1, 9);
        let mut second = first
            .transition_to(
                PaymentStatus::Processing,
                UpdatedBy::System,
                TransitionDetails::default(),
            )
            .unwrap();
        second.updated_at = timestamp(3, 9);

        let history = PaymentStatusHistory::new(
            "sum-1".to_string(),
            vec![second.clone(), first.clone()],
        )
        .unwrap();

        assert_eq!(history.records()[0].id, first.id);
        assert_eq!(history.latest_status().unwrap().id, second.id);
    }

    #[test]
    fn empty_history_has_no_latest_status() {
        let history = PaymentStatusHistory::new("sum-1".to_string(), vec![]).unwrap();
        assert!(matches!(
            history.latest_status(),
            Err(EngineError::StatusNotFound(_))
        ));
    }

    #[test]
    fn status_at_finds_the_record_in_effect() {
        let mut first = PaymentStatusRecord::initial("sum-1".to_string());
        first.updated_at = timestamp(1, 9);
        let mut second = first
            .transition_to(
                PaymentStatus::Processing,
                UpdatedBy::System,
                TransitionDetails::default(),
            )
            .unwrap();
        second.updated_at = timestamp(3, 9);

        let history =
            PaymentStatusHistory::new("sum-1".to_string(), vec![first.clone(), second.clone()])
                .unwrap();

        // between the two records the first is in effect
        assert_eq!(history.status_at(timestamp(2, 0)).unwrap().id, first.id);
        // an exact timestamp hit counts
        assert_eq!(history.status_at(timestamp(3, 9)).unwrap().id, second.id);
        // before everything there is no status
        assert!(history.status_at(timestamp(1, 8)).is_none());
    }
}
