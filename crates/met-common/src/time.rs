//! Time handling for GRIB band metadata.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Render a timestamp the way GRIB band metadata stores it: right-aligned
/// epoch seconds followed by " sec UTC".
pub fn format_metadata_timestamp(time: DateTime<Utc>) -> String {
    format!("{:>12} sec UTC", time.timestamp())
}

fn epoch_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(-?\d+)(?:\s*sec(?:onds)?(?:\s+UTC)?)?\s*$")
            .unwrap_or_else(|e| panic!("invalid epoch pattern: {e}"))
    })
}

/// Parse a timestamp stored in band metadata.
///
/// Accepts `"  1583020800 sec UTC"`, bare epoch seconds and ISO 8601 strings
/// (with or without offset; naive values are taken as UTC).
pub fn parse_metadata_timestamp(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Some(caps) = epoch_pattern().captures(s) {
        let secs: i64 = caps[1]
            .parse()
            .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))?;
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| TimeParseError::OutOfRange(secs));
    }

    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Timestamp out of range: {0}")]
    OutOfRange(i64),
}
