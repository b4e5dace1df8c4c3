//! Billing-cycle date arithmetic
//!
//! Maps raw card-transaction dates to billing months and derives the
//! closing and payment dates a cycle configuration implies. All functions
//! are pure; inputs are assumed to be pre-validated integers in 0-31 and
//! valid dates.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::BillingMonth;

/// Day-of-month value meaning "end of month", interchangeable with 31
pub const END_OF_MONTH: u32 = 0;

/// Number of days in the given calendar month
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .expect("valid month between 1 and 12")
}

/// A card's billing-cycle configuration.
///
/// `closing_day` is the day-of-month the cycle closes on; `payment_day` is
/// the day-of-month the payment is debited in the month after closing. For
/// both, 0 and 31 mean "end of month", and days that do not exist in a
/// given month (29, 30, 31) degrade to that month's last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingCycle {
    /// Day-of-month the billing cycle closes (0-31)
    pub closing_day: u32,
    /// Day-of-month the payment is debited (0-31)
    pub payment_day: u32,
}

impl BillingCycle {
    /// Create a billing cycle configuration
    pub fn new(closing_day: u32, payment_day: u32) -> Self {
        Self {
            closing_day,
            payment_day,
        }
    }

    /// The billing month a card transaction on `transaction_date` is
    /// attributed to.
    ///
    /// End-of-month cycles attribute every transaction to its own calendar
    /// month. Otherwise transactions up to and including the effective
    /// closing day belong to the transaction's month, later ones to the
    /// next month.
    pub fn billing_month_for(&self, transaction_date: NaiveDate) -> BillingMonth {
        let own_month = BillingMonth::containing(transaction_date);
        if is_end_of_month(self.closing_day) {
            return own_month;
        }

        let effective_closing = self.closing_day.min(last_day_of_month(
            transaction_date.year(),
            transaction_date.month(),
        ));
        if transaction_date.day() <= effective_closing {
            own_month
        } else {
            own_month.next()
        }
    }

    /// The calendar date the given billing month closes on
    pub fn closing_date(&self, billing_month: BillingMonth) -> NaiveDate {
        let last = last_day_of_month(billing_month.year(), billing_month.month());
        let day = if is_end_of_month(self.closing_day) {
            last
        } else {
            self.closing_day.min(last)
        };
        NaiveDate::from_ymd_opt(billing_month.year(), billing_month.month(), day)
            .expect("day clamped to the month's length")
    }

    /// The payment date implied by a closing date.
    ///
    /// Payment always falls in the month after the closing date, on
    /// `payment_day` clamped to that month's last day.
    pub fn payment_date(&self, closing_date: NaiveDate) -> NaiveDate {
        let payment_month = BillingMonth::containing(closing_date).next();
        let last = last_day_of_month(payment_month.year(), payment_month.month());
        let day = if is_end_of_month(self.payment_day) {
            last
        } else {
            self.payment_day.min(last)
        };
        NaiveDate::from_ymd_opt(payment_month.year(), payment_month.month(), day)
            .expect("day clamped to the month's length")
    }

    /// The payment date for a raw transaction date: attribution, closing
    /// and payment derivation in one step
    pub fn payment_date_for(&self, transaction_date: NaiveDate) -> NaiveDate {
        let month = self.billing_month_for(transaction_date);
        self.payment_date(self.closing_date(month))
    }
}

fn is_end_of_month(day: u32) -> bool {
    day == END_OF_MONTH || day == 31
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn end_of_month_cycle_keeps_own_month() {
        for closing_day in [0, 31] {
            let cycle = BillingCycle::new(closing_day, 27);
            assert_eq!(
                cycle.billing_month_for(date(2025, 1, 1)).to_string(),
                "2025-01"
            );
            assert_eq!(
                cycle.billing_month_for(date(2025, 1, 31)).to_string(),
                "2025-01"
            );
        }
    }

    #[test]
    fn mid_month_closing_splits_on_closing_day() {
        let cycle = BillingCycle::new(15, 10);
        assert_eq!(
            cycle.billing_month_for(date(2025, 1, 15)).to_string(),
            "2025-01"
        );
        assert_eq!(
            cycle.billing_month_for(date(2025, 1, 16)).to_string(),
            "2025-02"
        );
    }

    #[test]
    fn billing_month_rolls_over_year() {
        let cycle = BillingCycle::new(15, 10);
        assert_eq!(
            cycle.billing_month_for(date(2024, 12, 20)).to_string(),
            "2025-01"
        );
    }

    #[test]
    fn closing_day_degrades_in_short_months() {
        // A configured 30th closes February on its actual last day
        let cycle = BillingCycle::new(30, 10);
        assert_eq!(
            cycle.billing_month_for(date(2025, 2, 28)).to_string(),
            "2025-02"
        );
    }

    #[test]
    fn closing_date_clamps_to_month_end() {
        let cycle = BillingCycle::new(31, 10);
        assert_eq!(
            cycle.closing_date("2025-02".parse().unwrap()),
            date(2025, 2, 28)
        );
        assert_eq!(
            cycle.closing_date("2024-02".parse().unwrap()),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn closing_date_uses_configured_day_when_it_exists() {
        let cycle = BillingCycle::new(15, 10);
        assert_eq!(
            cycle.closing_date("2025-03".parse().unwrap()),
            date(2025, 3, 15)
        );
    }

    #[test]
    fn payment_date_falls_in_following_month() {
        let cycle = BillingCycle::new(31, 10);
        assert_eq!(cycle.payment_date(date(2025, 1, 31)), date(2025, 2, 10));
    }

    #[test]
    fn payment_day_clamps_to_following_month_end() {
        let cycle = BillingCycle::new(31, 31);
        assert_eq!(cycle.payment_date(date(2025, 1, 31)), date(2025, 2, 28));
    }

    #[test]
    fn payment_date_rolls_over_year() {
        let cycle = BillingCycle::new(31, 10);
        assert_eq!(cycle.payment_date(date(2024, 12, 31)), date(2025, 1, 10));
    }

    #[test]
    fn payment_date_for_chains_the_full_cycle() {
        // Closing on the 15th, paying on the 10th of the following month:
        // a January 16th purchase lands in the February cycle, paid March 10th
        let cycle = BillingCycle::new(15, 10);
        assert_eq!(cycle.payment_date_for(date(2025, 1, 16)), date(2025, 3, 10));
    }

    #[test]
    fn last_day_of_month_handles_leap_years() {
        assert_eq!(last_day_of_month(2024, 2), 29);
        assert_eq!(last_day_of_month(2025, 2), 28);
        assert_eq!(last_day_of_month(2025, 4), 30);
        assert_eq!(last_day_of_month(2025, 12), 31);
    }
}
