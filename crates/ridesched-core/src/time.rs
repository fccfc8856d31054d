//! Date/time helpers shared by both API dialects.
//!
//! The legacy dialect carries combined timestamps (`starts_at`), the versioned
//! dialect carries a separate date, time and optional zone. This module
//! converts between the two without knowing anything about either dialect.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default offset applied when a split date/time has no usable zone (UTC-08:00).
pub const DEFAULT_UTC_OFFSET_SECS: i32 = -8 * 3600;

/// Returns the default offset as a [`FixedOffset`].
pub fn default_utc_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).expect("valid default offset")
}

/// A date/time split into the versioned dialect's separate fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDateTime {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    pub time: String,
}

/// Splits a timestamp into date and wall-clock time in its own offset.
pub fn split(dt: &DateTime<FixedOffset>) -> SplitDateTime {
    SplitDateTime {
        date: dt.format("%Y-%m-%d").to_string(),
        time: dt.format("%H:%M").to_string(),
    }
}

/// Formats a timestamp the way the legacy dialect expects it.
pub fn format_timestamp(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parses a combined timestamp.
///
/// Accepts RFC 3339 as well as the minute-precision variant
/// (`2025-01-25T09:30-08:00`) the legacy dialect sometimes emits.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z"))
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// Parses a numeric zone designator into an offset.
///
/// Recognises `Z`, `UTC`, `GMT`, `+HH:MM`, `-HHMM` and `+HH`. Named zones such
/// as `America/Los_Angeles` return `None`.
pub fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    if zone.eq_ignore_ascii_case("z")
        || zone.eq_ignore_ascii_case("utc")
        || zone.eq_ignore_ascii_case("gmt")
    {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match zone.as_bytes().first()? {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parses a wall-clock time (`HH:MM` or `HH:MM:SS`).
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Combines a split date, optional time and optional zone into one timestamp.
///
/// A missing time means midnight. A missing zone, or a named zone that cannot
/// be resolved to a fixed offset, falls back to `default_offset`; this is an
/// approximation that ignores daylight-saving transitions.
pub fn combine(
    date: &str,
    time: Option<&str>,
    zone: Option<&str>,
    default_offset: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = match time.filter(|t| !t.trim().is_empty()) {
        Some(t) => parse_time(t)?,
        None => NaiveTime::MIN,
    };

    let offset = match zone.filter(|z| !z.trim().is_empty()) {
        Some(z) => parse_offset(z).unwrap_or_else(|| {
            debug!(zone = %z, "unresolvable time zone, using default offset");
            default_offset
        }),
        None => default_offset,
    };

    offset.from_local_datetime(&date.and_time(time)).single()
}

/// Parses a `YYYY-MM-DD` or `MM/DD/YYYY` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
}
