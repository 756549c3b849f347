//! Timestamp handling for SIRI feeds.
//!
//! SIRI carries ISO-8601 timestamps with an explicit UTC offset. We keep the
//! offset as received so values can be logged as the producer sent them;
//! comparisons between timestamps are always by instant.

use chrono::{DateTime, FixedOffset};

/// An offset-aware instant as carried by the feed.
pub type Timestamp = DateTime<FixedOffset>;

/// Error returned when parsing an invalid timestamp string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Parse an ISO-8601 timestamp that carries a UTC offset.
///
/// Accepts RFC 3339 (`2023-01-01T10:00:00+01:00`, `2023-01-01T09:00:00Z`,
/// fractional seconds allowed), minute precision (`2023-01-01T10:00+01:00`),
/// and a trailing bracketed zone id as emitted by some producers
/// (`2023-01-01T10:00:00+01:00[Europe/Paris]`). The zone id is ignored; the
/// offset is authoritative.
///
/// # Examples
///
/// ```
/// use et_updater::domain::parse_timestamp;
///
/// let t = parse_timestamp("2023-01-01T10:00:00+01:00").unwrap();
/// assert_eq!(t.to_rfc3339(), "2023-01-01T10:00:00+01:00");
///
/// // Naive timestamps are rejected
/// assert!(parse_timestamp("2023-01-01T10:00:00").is_err());
/// ```
pub fn parse_timestamp(s: &str) -> Result<Timestamp, TimeError> {
    let s = strip_zone_id(s.trim())?;

    if s.is_empty() {
        return Err(TimeError::new("empty string"));
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t);
    }

    // RFC 3339 requires seconds; ISO-8601 does not.
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z") {
        return Ok(t);
    }
    if let Some(utc) = s.strip_suffix('Z')
        && let Ok(t) = DateTime::parse_from_str(&format!("{utc}+00:00"), "%Y-%m-%dT%H:%M%:z")
    {
        return Ok(t);
    }

    Err(TimeError::new("expected ISO-8601 date-time with UTC offset"))
}

/// Remove a trailing `[Region/City]` zone id, if present.
fn strip_zone_id(s: &str) -> Result<&str, TimeError> {
    match s.find('[') {
        None => Ok(s),
        Some(idx) if s.ends_with(']') => Ok(&s[..idx]),
        Some(_) => Err(TimeError::new("unterminated zone id")),
    }
}
