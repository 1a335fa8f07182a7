//! Timestamp type and its string form at the session-store boundary.
//!
//! Session stores are string-valued, so timestamps are written as RFC 3339
//! with nanosecond precision and parsed back on read, so a stored instant
//! reads back unchanged. Nothing outside this
//! module compares timestamps as strings.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

/// Wall-clock instant.
pub type Timestamp = DateTime<Utc>;

/// Format a timestamp for storage.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a stored timestamp.
///
/// Accepts any RFC 3339 offset and normalizes to UTC.
pub fn parse_timestamp(value: &str) -> Result<Timestamp> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| Error::InvalidTimestamp {
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_is_utc_with_nanos() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        assert_eq!(format_timestamp(ts), "2026-03-14T15:09:26.000000000Z");
    }

    #[test]
    fn test_parse_preserves_subsecond_precision() {
        let ts = Utc.timestamp_nanos(1_700_000_000_123_456_789);
        let parsed = parse_timestamp(&format_timestamp(ts)).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn test_parse_normalizes_offset() {
        let parsed = parse_timestamp("2026-03-14T17:09:26+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_timestamp("not-a-time").unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { .. }));
        assert!(err.to_string().contains("not-a-time"));
    }
}
