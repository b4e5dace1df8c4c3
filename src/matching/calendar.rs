//! Business-day arithmetic
//!
//! A business day is Monday through Friday; there is no holiday calendar.
//! All walks step one calendar day at a time, counting only weekdays.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Whether the date falls on a weekday
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The date `days` business days away from `start`.
///
/// Positive values walk forward, negative values backward; weekends are
/// stepped over without counting. `add_business_days(d, 0)` is `d` itself,
/// even on a weekend.
pub fn add_business_days(start: NaiveDate, days: i64) -> NaiveDate {
    let step = if days >= 0 {
        Duration::days(1)
    } else {
        Duration::days(-1)
    };
    let mut remaining = days.abs();
    let mut current = start;
    while remaining > 0 {
        current = current + step;
        if is_business_day(current) {
            remaining -= 1;
        }
    }
    current
}

/// Signed business-day distance from `from` to `to`.
///
/// Counts the weekdays in the half-open range between the two dates
/// (exclusive of the later endpoint). Positive when `to` is later than
/// `from`, negative when earlier, zero on the same day.
pub fn signed_business_days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    if from == to {
        return 0;
    }
    let (earlier, later, sign) = if from < to { (from, to, 1) } else { (to, from, -1) };

    let mut count = 0;
    let mut current = earlier;
    while current < later {
        if is_business_day(current) {
            count += 1;
        }
        current = current + Duration::days(1);
    }
    sign * count
}
