//! Inclusive day count between two calendar dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse an ISO-8601 date or timestamp into a UTC-anchored instant.
///
/// Plain dates are anchored at midnight. Timestamps with an offset are
/// converted to UTC; timestamps without one are taken as UTC.
pub fn parse_instant(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(input) {
        return Some(stamp.with_timezone(&Utc).naive_utc());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
}

/// Number of days covered by `start..=end`.
///
/// Total: an unparseable input or an end before the start yields 0.
pub fn days(start: &str, end: &str) -> i64 {
    let (Some(start), Some(end)) = (parse_instant(start), parse_instant(end)) else {
        return 0;
    };
    if end < start {
        return 0;
    }
    (end - start).num_seconds().div_euclid(SECONDS_PER_DAY) + 1
}
