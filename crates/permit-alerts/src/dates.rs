//! Calendar arithmetic for the deadline rules.
//!
//! All values are brought into the evaluator's offset before subtracting, so
//! a date-only value means local midnight and day counts line up with the
//! calendar the user sees.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Naive formats tried after RFC 3339, interpreted in the evaluator's offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying formats the store emits besides RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("date value is empty")]
    Empty,

    #[error("unrecognized date format: {0:?}")]
    Unrecognized(String),
}

/// Parse a stored date or timestamp into wall-clock time at `offset`.
pub fn parse_local(raw: &str, offset: FixedOffset) -> Result<NaiveDateTime, DateParseError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DateParseError::Empty);
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&offset).naive_local());
    }

    for format in OFFSET_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(value, format) {
            return Ok(instant.with_timezone(&offset).naive_local());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive);
        }
    }

    Err(DateParseError::Unrecognized(value.to_string()))
}

/// Whole days until `target`, rounded up. Negative once `target` has passed.
#[must_use]
pub fn days_until(target: NaiveDateTime, now: NaiveDateTime) -> i64 {
    let millis = (target - now).num_milliseconds();
    let days = millis.div_euclid(DAY_MILLIS);
    if millis.rem_euclid(DAY_MILLIS) == 0 {
        days
    } else {
        days + 1
    }
}

/// Whole days elapsed since `earlier`, rounded down.
#[must_use]
pub fn days_since(earlier: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - earlier).num_milliseconds().div_euclid(DAY_MILLIS)
}
