//! Generic date-string parsing
//!
//! Accepts the formats people actually export: ISO 8601 / RFC 3339,
//! naive ISO date-times (local time), bare ISO dates (UTC midnight),
//! US-style `MM/DD/YYYY` dates and RFC 2822.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

const NAIVE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a timestamp field to epoch milliseconds
pub fn parse_timestamp_millis(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_millis(naive);
        }
    }

    // Date-only ISO strings are UTC, everything else without an offset is local
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return date.and_hms_opt(0, 0, 0).and_then(local_millis);
    }

    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

fn local_millis(naive: NaiveDateTime) -> Option<i64> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

/// Render epoch milliseconds as a local date-time for display
pub fn format_local(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc.with_timezone(&Local).format("%c").to_string(),
        None => "Invalid Date".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339() {
        assert_eq!(parse_timestamp_millis("2020-01-01T00:00:00Z"), Some(1_577_836_800_000));
        assert_eq!(
            parse_timestamp_millis("2020-01-01T01:00:00+01:00"),
            Some(1_577_836_800_000)
        );
        assert_eq!(
            parse_timestamp_millis("2020-01-01T00:00:00.250Z"),
            Some(1_577_836_800_250)
        );
    }

    #[test]
    fn test_date_only_is_utc() {
        assert_eq!(parse_timestamp_millis("2020-01-02"), Some(1_577_923_200_000));
    }

    #[test]
    fn test_naive_formats_are_local() {
        let naive = NaiveDate::from_ymd_opt(2021, 6, 15)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let expected = local_millis(naive);
        assert!(expected.is_some());
        assert_eq!(parse_timestamp_millis("2021-06-15T12:30:00"), expected);
        assert_eq!(parse_timestamp_millis("2021-06-15 12:30"), expected);
        assert_eq!(parse_timestamp_millis("06/15/2021 12:30:00"), expected);
    }

    #[test]
    fn test_rfc2822() {
        assert_eq!(
            parse_timestamp_millis("Wed, 01 Jan 2020 00:00:00 +0000"),
            Some(1_577_836_800_000)
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timestamp_millis(""), None);
        assert_eq!(parse_timestamp_millis("yesterday"), None);
        assert_eq!(parse_timestamp_millis("2020-13-01"), None);
    }

    #[test]
    fn test_format_local_matches_chrono() {
        let millis = 1_577_836_800_000;
        let expected = DateTime::from_timestamp_millis(millis)
            .unwrap()
            .with_timezone(&Local)
            .format("%c")
            .to_string();
        assert_eq!(format_local(millis), expected);
        assert_eq!(format_local(i64::MAX), "Invalid Date");
    }
}
