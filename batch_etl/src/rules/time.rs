//! Timestamp parsing and hour bucketing.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a timestamp string. Offsets are converted to UTC; naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a timestamp column value; non-strings are null.
pub fn timestamp_of(value: Option<&Value>) -> Option<NaiveDateTime> {
    value.and_then(Value::as_str).and_then(parse_timestamp)
}

/// Start of the hour, formatted `yyyy-MM-dd HH:00:00`.
pub fn hour_bucket(value: Option<&Value>) -> Option<String> {
    timestamp_of(value).map(|ts| ts.format("%Y-%m-%d %H:00:00").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hour_bucket_formats() {
        let cases = [
            ("2025-03-01T12:34:56.123456", "2025-03-01 12:00:00"),
            ("2025-03-01T23:59:59", "2025-03-01 23:00:00"),
            ("2025-03-01 07:05:00", "2025-03-01 07:00:00"),
            ("2025-03-01T12:34:56+05:30", "2025-03-01 07:00:00"),
            ("2025-03-01T00:10:00Z", "2025-03-01 00:00:00"),
            ("2025-03-01", "2025-03-01 00:00:00"),
        ];
        for (input, expected) in cases {
            assert_eq!(hour_bucket(Some(&json!(input))).as_deref(), Some(expected), "{input}");
        }
    }

    #[test]
    fn test_unparseable_is_null() {
        assert_eq!(hour_bucket(Some(&json!("yesterday"))), None);
        assert_eq!(hour_bucket(Some(&json!(1700000000))), None);
        assert_eq!(hour_bucket(None), None);
    }
}
