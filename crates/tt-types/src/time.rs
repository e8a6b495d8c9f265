//! Timestamp parsing and the canonical storage format.
//!
//! Events arrive with ISO-8601-ish timestamps from several collectors.
//! Everything is normalized to a single fixed-width UTC format on insert so
//! that lexicographic comparison in SQL agrees with instant order.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Canonical storage format: fixed-width UTC with millisecond precision.
pub const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Parse an ISO-8601-ish timestamp. Accepts RFC 3339 (any offset, converted
/// to UTC) and naive `YYYY-MM-DDTHH:MM:SS[.fff]` values, which are assumed
/// to already be UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format a timestamp in the canonical storage format.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(STORAGE_FORMAT).to_string()
}

/// Serde adapter keeping the canonical format in JSON output as well.
pub mod ts_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(*ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339_utc() {
        let ts = parse_timestamp("2025-01-25T10:00:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 1, 25, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_offset_converted_to_utc() {
        let ts = parse_timestamp("2025-01-25T12:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 1, 25, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_assumed_utc() {
        let ts = parse_timestamp("2025-01-25T10:00:00.500").unwrap();
        assert_eq!(format_timestamp(ts), "2025-01-25T10:00:00.500Z");
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_timestamp("not-a-timestamp").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_format_is_fixed_width() {
        let whole = parse_timestamp("2025-01-25T10:00:00Z").unwrap();
        let fractional = parse_timestamp("2025-01-25T10:00:00.500Z").unwrap();
        assert_eq!(format_timestamp(whole), "2025-01-25T10:00:00.000Z");
        assert_eq!(format_timestamp(fractional), "2025-01-25T10:00:00.500Z");
        // Lexicographic order must match instant order after normalization.
        assert!(format_timestamp(whole) < format_timestamp(fractional));
    }
}
