//! Timestamp utilities
//!
//! Every insert path stores timestamps as RFC 3339 UTC text with microsecond
//! precision. Legacy rows may hold naive timestamps; those are read as UTC,
//! and queries compare through SQLite's `julianday` so both forms order
//! correctly.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

/// Naive layouts found in legacy rows, tried in order
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Canonical storage form of a timestamp
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time in canonical storage form
pub fn now_string() -> String {
    format_timestamp(&now())
}

/// Parse a stored timestamp, treating naive values as UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(date_to_timestamp)
}

/// Rewrite a stored timestamp into canonical form
///
/// Returns `None` when the value cannot be parsed at all.
pub fn normalize_timestamp(value: &str) -> Option<String> {
    parse_timestamp(value).map(|dt| format_timestamp(&dt))
}

/// Midnight UTC on the given date
pub fn date_to_timestamp(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// First instant of the UTC month containing `dt`
pub fn start_of_month(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive()
        .with_day0(0)
        .map(date_to_timestamp)
        .unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_format_is_fixed_width_utc() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_timestamp(&dt), "2026-03-04T05:06:07.000000Z");
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_timestamp("2026-03-04T06:00:00+01:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 3, 4, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_treated_as_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 1).unwrap();
        assert_eq!(parse_timestamp("2025-12-31 23:59:01"), Some(expected));
        assert_eq!(parse_timestamp("2025-12-31T23:59:01"), Some(expected));
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_timestamp("2025-06-01").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_timestamp("2025-01-02 03:04:05").unwrap();
        assert_eq!(once, "2025-01-02T03:04:05.000000Z");
        assert_eq!(normalize_timestamp(&once).unwrap(), once);
    }

    #[test]
    fn test_start_of_month() {
        let dt = Utc.with_ymd_and_hms(2026, 10, 16, 14, 30, 0).unwrap();
        assert_eq!(
            start_of_month(dt),
            Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_canonical_strings_order_chronologically() {
        let earlier = format_timestamp(&Utc.with_ymd_and_hms(2026, 9, 30, 23, 59, 59).unwrap());
        let later = format_timestamp(&Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap());
        assert!(earlier < later);
    }
}
