//! Timestamp parsing and calendar helpers.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("unrecognized timestamp: '{0}'")]
pub struct TimestampError(pub String);

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse RFC 3339, a naive datetime (taken as UTC), a bare date, or epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(ms) = s.parse::<i64>() {
        if let Some(dt) = Utc.timestamp_millis_opt(ms).single() {
            return Ok(dt);
        }
    }
    Err(TimestampError(raw.to_string()))
}

/// ISO (year, week) key. Year is part of the key so week 1 of consecutive years differ.
pub fn iso_week_key(ts: DateTime<Utc>) -> (i32, u32) {
    let week = ts.iso_week();
    (week.year(), week.week())
}
