//! Core types and data structures shared across the reconciliation system

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A billing month in `YYYY-MM` form.
///
/// Construction is validated; an instance always holds a four-digit year
/// and a month between 1 and 12. The serialized form is the `YYYY-MM`
/// string used everywhere upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillingMonth {
    year: i32,
    month: u32,
}

impl BillingMonth {
    /// Create a billing month from year and month numbers
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        if !(0..=9999).contains(&year) {
            return Err(EngineError::Validation(format!(
                "Billing month year must be four digits, got {}",
                year
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(EngineError::Validation(format!(
                "Billing month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// The calendar year
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The calendar month (1-12)
    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("year and month validated at construction")
    }

    /// The following billing month, rolling the year over after December
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The billing month a calendar date falls in
    pub fn containing(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingMonth {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || EngineError::Validation(format!("Billing month must match YYYY-MM, got '{}'", s));

        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        if !s[..4].bytes().all(|b| b.is_ascii_digit())
            || !s[5..].bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = s[..4].parse().map_err(|_| invalid())?;
        let month: u32 = s[5..].parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self { year, month })
    }
}

impl TryFrom<String> for BillingMonth {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BillingMonth> for String {
    fn from(value: BillingMonth) -> Self {
        value.to_string()
    }
}

/// A card's monthly billing summary, produced upstream and consumed
/// read-only by the matcher and scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSummary {
    /// Unique identifier assigned upstream
    pub id: String,
    /// The card this summary belongs to
    pub card_id: String,
    /// Display name of the card, used to derive matching keywords
    pub card_name: String,
    /// Billing month the summary covers
    pub billing_month: BillingMonth,
    /// Cycle closing date
    pub closing_date: NaiveDate,
    /// Date the payment is debited from the bank account
    pub payment_date: NaiveDate,
    /// Amount to be debited, in whole yen
    pub net_payment_amount: i64,
    /// Card transactions aggregated into this summary
    pub transaction_ids: Vec<String>,
}

impl BillingSummary {
    /// Create a billing summary, validating its invariants
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        card_id: String,
        card_name: String,
        billing_month: BillingMonth,
        closing_date: NaiveDate,
        payment_date: NaiveDate,
        net_payment_amount: i64,
        transaction_ids: Vec<String>,
    ) -> EngineResult<Self> {
        crate::utils::validation::validate_non_empty("Billing summary ID", &id)?;
        crate::utils::validation::validate_non_empty("Card ID", &card_id)?;
        crate::utils::validation::validate_non_empty("Card name", &card_name)?;
        crate::utils::validation::validate_non_negative_amount(
            "Net payment amount",
            net_payment_amount,
        )?;

        Ok(Self {
            id,
            card_id,
            card_name,
            billing_month,
            closing_date,
            payment_date,
            net_payment_amount,
            transaction_ids,
        })
    }
}

/// An externally observed bank-account transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    /// Unique identifier assigned by the bank data source
    pub id: String,
    /// Posting date
    pub date: NaiveDate,
    /// Debit amount in whole yen
    pub amount: i64,
    /// Free-text statement description
    pub description: String,
}

impl BankTransaction {
    /// Create a bank transaction, validating its invariants
    pub fn new(
        id: String,
        date: NaiveDate,
        amount: i64,
        description: String,
    ) -> EngineResult<Self> {
        crate::utils::validation::validate_non_empty("Bank transaction ID", &id)?;
        Ok(Self {
            id,
            date,
            amount,
            description,
        })
    }
}

/// Who initiated a payment status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatedBy {
    /// Automatic change made by the scheduler or reconciliation engine
    System,
    /// Manual change made by an operator
    User,
}

/// One of several equally plausible bank transactions, reported when a
/// match cannot be resolved automatically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub id: String,
    pub date: NaiveDate,
    pub amount: i64,
    pub description: String,
}

impl From<&BankTransaction> for MatchCandidate {
    fn from(tx: &BankTransaction) -> Self {
        Self {
            id: tx.id.clone(),
            date: tx.date,
            amount: tx.amount,
            description: tx.description.clone(),
        }
    }
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Billing summary not found for card '{card_id}' in {billing_month}")]
    SummaryNotFound {
        card_id: String,
        billing_month: BillingMonth,
    },
    #[error("No payment status record found for card summary '{0}'")]
    StatusNotFound(String),
    #[error("Payment date {payment_date} is still in the future; reconciliation runs in arrears")]
    PaymentDateInFuture { payment_date: NaiveDate },
    #[error("Ambiguous match: {} equally plausible bank transactions", candidates.len())]
    AmbiguousMatch { candidates: Vec<MatchCandidate> },
    #[error("Invalid payment status transition from {from} to {to}")]
    InvalidTransition {
        from: crate::status::PaymentStatus,
        to: crate::status::PaymentStatus,
    },
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for reconciliation operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_month_parses_and_formats() {
        let month: BillingMonth = "2025-01".parse().unwrap();
        assert_eq!(month.year(), 2025);
        assert_eq!(month.month(), 1);
        assert_eq!(month.to_string(), "2025-01");
    }

    #[test]
    fn billing_month_rejects_bad_input() {
        assert!("2025-13".parse::<BillingMonth>().is_err());
        assert!("2025-00".parse::<BillingMonth>().is_err());
        assert!("25-01".parse::<BillingMonth>().is_err());
        assert!("2025/01".parse::<BillingMonth>().is_err());
        assert!("".parse::<BillingMonth>().is_err());
        assert!("2025-1".parse::<BillingMonth>().is_err());
    }

    #[test]
    fn billing_month_next_rolls_year() {
        let december = BillingMonth::new(2024, 12).unwrap();
        let next = december.next();
        assert_eq!(next.year(), 2025);
        assert_eq!(next.month(), 1);
    }

    #[test]
    fn billing_month_serde_round_trip() {
        let month = BillingMonth::new(2025, 3).unwrap();
        let json = serde_json::to_string(&month).unwrap();
        assert_eq!(json, "\"2025-03\"");
        let back: BillingMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, month);
    }

    #[test]
    fn billing_summary_rejects_negative_amount() {
        let result = BillingSummary::new(
            "sum-1".to_string(),
            "card-1".to_string(),
            "Test Card".to_string(),
            BillingMonth::new(2025, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
            -1,
            vec![],
        );
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn billing_summary_rejects_empty_card_name() {
        let result = BillingSummary::new(
            "sum-1".to_string(),
            "card-1".to_string(),
            "  ".to_string(),
            BillingMonth::new(2025, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
            10000,
            vec![],
        );
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }
}
