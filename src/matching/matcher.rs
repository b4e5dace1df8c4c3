//! Matching engine for billing summaries against bank transactions
//!
//! The matcher is a pure function over its inputs: a billing summary and a
//! candidate list of bank transactions in, exactly one graded
//! [`ReconciliationResult`] out. Candidates pass through three filters in
//! order (payment-date window, exact amount, normalized description) and
//! the survivors decide the confidence grade. Ties the rules cannot break
//! surface as [`EngineError::AmbiguousMatch`] for manual resolution.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::matching::calendar::{add_business_days, signed_business_days_between};
use crate::types::{BankTransaction, BillingSummary, EngineError, EngineResult, MatchCandidate};

/// Issuer-name fragments recognized in card names, grouped by issuer.
/// Card names carry the marketing spelling while bank statements print
/// katakana or romaji, so a hit on any fragment of a group makes every
/// fragment of that group a keyword for the description filter.
const ISSUER_KEYWORD_GROUPS: &[&[&str]] = &[
    &["楽天", "ラクテン", "rakuten"],
    &["三井住友", "ミツイスミトモ", "smbc"],
    &["jcb", "ジェーシービー"],
    &["エポス", "epos"],
    &["セゾン", "saison"],
    &["イオン", "aeon"],
    &["オリコ", "orico"],
    &["ニコス", "nicos"],
    &["三菱ufj", "ミツビシufj", "mufg"],
    &["アメックス", "amex", "americanexpress"],
    &["ビューカード", "ビューカ"],
    &["dカード", "docomo", "ドコモ"],
    &["paypay", "ペイペイ"],
];

/// Fallback tokens used when the card name contains no known issuer
/// fragment
const GENERIC_KEYWORDS: &[&str] = &["カード", "card", "クレジット", "credit"];

/// Characters treated as dashes during description normalization
const DASH_CHARS: &[char] = &['-', '‐', '–', '—', '―', '−', 'ー', '－'];

/// Full match: amount, date window and description all agree
pub const CONFIDENCE_FULL: u8 = 100;
/// Partial match: amount and date agree, description does not
pub const CONFIDENCE_PARTIAL: u8 = 70;
/// No match within the payment window
pub const CONFIDENCE_NONE: u8 = 0;

/// Outcome of one reconciliation attempt for one billing summary.
///
/// Matched results always carry the bank transaction id and match date;
/// unmatched results always carry a discrepancy. The constructors are the
/// only way to build one, so the pairing cannot be violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Whether a bank debit was identified as this card payment
    pub is_matched: bool,
    /// Match strength: 0, 70 or 100
    pub confidence: u8,
    /// The matched bank transaction, present iff matched
    pub bank_transaction_id: Option<String>,
    /// The billing summary this result concerns
    pub card_summary_id: String,
    /// Date of the matched bank debit, present iff matched
    pub matched_at: Option<NaiveDate>,
    /// What kept the candidates from matching, present iff not matched
    pub discrepancy: Option<Discrepancy>,
}

impl ReconciliationResult {
    /// A full-confidence match against `transaction`
    pub fn full_match(card_summary_id: String, transaction: &BankTransaction) -> Self {
        Self {
            is_matched: true,
            confidence: CONFIDENCE_FULL,
            bank_transaction_id: Some(transaction.id.clone()),
            card_summary_id,
            matched_at: Some(transaction.date),
            discrepancy: None,
        }
    }

    /// A partial match: amount and date lined up, description did not
    pub fn partial_match(card_summary_id: String, discrepancy: Discrepancy) -> Self {
        Self {
            is_matched: false,
            confidence: CONFIDENCE_PARTIAL,
            bank_transaction_id: None,
            card_summary_id,
            matched_at: None,
            discrepancy: Some(discrepancy),
        }
    }

    /// No candidate matched the payment amount
    pub fn unmatched(card_summary_id: String, discrepancy: Discrepancy) -> Self {
        Self {
            is_matched: false,
            confidence: CONFIDENCE_NONE,
            bank_transaction_id: None,
            card_summary_id,
            matched_at: None,
            discrepancy: Some(discrepancy),
        }
    }
}

/// Why a reconciliation attempt did not produce a full match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Yen difference against the reported candidate; the full payment
    /// amount when the window held no candidate at all
    pub amount_difference: i64,
    /// Signed business days between the payment date and the candidate
    pub date_difference: i64,
    /// Whether the candidate's description matched the card keywords
    pub description_match: bool,
    /// Human-readable explanation
    pub reason: String,
}

impl Discrepancy {
    /// Create a discrepancy, validating that the reason is present
    pub fn new(
        amount_difference: i64,
        date_difference: i64,
        description_match: bool,
        reason: String,
    ) -> EngineResult<Self> {
        crate::utils::validation::validate_non_empty("Discrepancy reason", &reason)?;
        Ok(Self {
            amount_difference,
            date_difference,
            description_match,
            reason,
        })
    }
}

/// The matching engine.
///
/// Pure, synchronous and stateless apart from its configuration; safe to
/// share across concurrent callers.
#[derive(Debug, Clone)]
pub struct ReconciliationMatcher {
    /// Half-width of the search window around the payment date, in
    /// business days
    pub window_business_days: i64,
}

impl Default for ReconciliationMatcher {
    fn default() -> Self {
        Self {
            window_business_days: 3,
        }
    }
}

impl ReconciliationMatcher {
    /// Create a matcher with a custom window width
    pub fn new(window_business_days: i64) -> Self {
        Self {
            window_business_days,
        }
    }

    /// Inclusive date range searched around a payment date
    pub fn search_window(&self, payment_date: NaiveDate) -> (NaiveDate, NaiveDate) {
        (
            add_business_days(payment_date, -self.window_business_days),
            add_business_days(payment_date, self.window_business_days),
        )
    }

    /// Match one billing summary against the candidate transactions.
    ///
    /// Returns exactly one result; identical inputs yield identical
    /// results. Fails only when two or more candidates are equally
    /// plausible and the tie cannot be broken automatically.
    pub fn match_summary(
        &self,
        summary: &BillingSummary,
        candidates: &[BankTransaction],
    ) -> EngineResult<ReconciliationResult> {
        let (window_start, window_end) = self.search_window(summary.payment_date);

        let in_window: Vec<&BankTransaction> = candidates
            .iter()
            .filter(|tx| tx.date >= window_start && tx.date <= window_end)
            .collect();

        let amount_matched: Vec<&BankTransaction> = in_window
            .iter()
            .copied()
            .filter(|tx| tx.amount == summary.net_payment_amount)
            .collect();

        let keywords = keywords_for_card(&summary.card_name);
        let fully_matched: Vec<&BankTransaction> = amount_matched
            .iter()
            .copied()
            .filter(|tx| description_matches(&tx.description, &keywords))
            .collect();

        match fully_matched.as_slice() {
            [single] => Ok(ReconciliationResult::full_match(summary.id.clone(), single)),
            [] => self.resolve_without_description(summary, &in_window, &amount_matched, &keywords),
            several => Err(EngineError::AmbiguousMatch {
                candidates: several.iter().map(|tx| MatchCandidate::from(*tx)).collect(),
            }),
        }
    }

    /// Decide between a partial match and no match once the description
    /// filter has eliminated everything
    fn resolve_without_description(
        &self,
        summary: &BillingSummary,
        in_window: &[&BankTransaction],
        amount_matched: &[&BankTransaction],
        keywords: &[String],
    ) -> EngineResult<ReconciliationResult> {
        if let [first, rest @ ..] = amount_matched {
            let chosen = closest_by_payment_date(summary.payment_date, first, rest)?;
            let discrepancy = Discrepancy::new(
                0,
                signed_business_days_between(summary.payment_date, chosen.date),
                false,
                "amount and date matched but description did not".to_string(),
            )?;
            return Ok(ReconciliationResult::partial_match(
                summary.id.clone(),
                discrepancy,
            ));
        }

        if let [first, rest @ ..] = in_window {
            let mut closest = *first;
            for &tx in rest {
                let diff = (summary.net_payment_amount - tx.amount).abs();
                if diff < (summary.net_payment_amount - closest.amount).abs() {
                    closest = tx;
                }
            }
            let amount_difference = summary.net_payment_amount - closest.amount;
            let discrepancy = Discrepancy::new(
                amount_difference,
                signed_business_days_between(summary.payment_date, closest.date),
                description_matches(&closest.description, keywords),
                format!(
                    "no exact amount match; closest transaction '{}' differs by {} yen",
                    closest.id,
                    amount_difference.abs()
                ),
            )?;
            return Ok(ReconciliationResult::unmatched(
                summary.id.clone(),
                discrepancy,
            ));
        }

        let discrepancy = Discrepancy::new(
            summary.net_payment_amount,
            0,
            false,
            "no transaction found in the payment window".to_string(),
        )?;
        Ok(ReconciliationResult::unmatched(
            summary.id.clone(),
            discrepancy,
        ))
    }
}

/// The amount-matching transaction closest to the payment date. Two or
/// more candidates tied on distance cannot be resolved automatically.
fn closest_by_payment_date<'a>(
    payment_date: NaiveDate,
    first: &'a BankTransaction,
    rest: &[&'a BankTransaction],
) -> EngineResult<&'a BankTransaction> {
    let mut best = first;
    let mut best_distance = signed_business_days_between(payment_date, first.date).abs();
    let mut tied: Vec<&BankTransaction> = vec![first];

    for &tx in rest {
        let distance = signed_business_days_between(payment_date, tx.date).abs();
        if distance < best_distance {
            best = tx;
            best_distance = distance;
            tied.clear();
            tied.push(tx);
        } else if distance == best_distance {
            tied.push(tx);
        }
    }

    if tied.len() > 1 {
        return Err(EngineError::AmbiguousMatch {
            candidates: tied.iter().map(|tx| MatchCandidate::from(*tx)).collect(),
        });
    }
    Ok(best)
}

/// Strip whitespace and dash characters and lowercase the rest
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !DASH_CHARS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Keywords a bank-statement description must carry to be attributed to
/// the named card: every fragment of each issuer group the card name
/// hits, or the generic token set when no group matches
fn keywords_for_card(card_name: &str) -> Vec<String> {
    let normalized_name = normalize(card_name);
    let issuer_hits: Vec<String> = ISSUER_KEYWORD_GROUPS
        .iter()
        .filter(|group| {
            group
                .iter()
                .any(|fragment| normalized_name.contains(normalize(fragment).as_str()))
        })
        .flat_map(|group| group.iter().map(|fragment| normalize(fragment)))
        .collect();

    if issuer_hits.is_empty() {
        GENERIC_KEYWORDS.iter().map(|kw| normalize(kw)).collect()
    } else {
        issuer_hits
    }
}

fn description_matches(description: &str, keywords: &[String]) -> bool {
    let normalized = normalize(description);
    keywords.iter().any(|kw| normalized.contains(kw.as_str()))
}
