//! Timestamp parsing shared by CSV inference and the TRY_CAST evaluator.
//!
//! Timestamps are naive wall-clock values stored as microseconds since the
//! Unix epoch. No time zone is attached or assumed.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const MICROS_PER_MINUTE: i64 = 60 * 1_000_000;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp literal, returning epoch microseconds.
///
/// Accepts `YYYY-MM-DD HH:MM[:SS[.ffffff]]` (space or `T` separator) and a
/// bare `YYYY-MM-DD` (midnight). Surrounding whitespace is ignored.
pub fn parse_timestamp_micros(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.len() < 10 {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_micros());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_micros())
}

/// Render epoch microseconds back to `YYYY-MM-DD HH:MM:SS[.ffffff]`.
pub fn format_timestamp_micros(micros: i64) -> String {
    match DateTime::from_timestamp_micros(micros) {
        Some(dt) => {
            let naive = dt.naive_utc();
            if micros.rem_euclid(1_000_000) == 0 {
                naive.format("%Y-%m-%d %H:%M:%S").to_string()
            } else {
                naive.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
            }
        }
        None => micros.to_string(),
    }
}

/// Number of minute boundaries crossed going from `start` to `end`.
///
/// Both sides are truncated to the minute before subtracting, so
/// `08:00:59 -> 08:01:00` counts as one minute and `08:00:00 -> 08:00:59`
/// as zero. Negative when `end` precedes `start`.
pub fn minute_diff(start_micros: i64, end_micros: i64) -> i64 {
    end_micros.div_euclid(MICROS_PER_MINUTE) - start_micros.div_euclid(MICROS_PER_MINUTE)
}
