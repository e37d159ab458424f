//! Time handling for model time axes.
//!
//! Independent models do not share a time grid origin: the consensus
//! axis is hourly on the hour, while regional runs may carry offsets or
//! minute-resolution stamps. Alignment therefore happens on a
//! *truncated-hour key*, the timestamp re-rendered with minutes and
//! seconds zeroed, rather than on exact string equality.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::{NowcastError, NowcastResult};

/// Parse a model timestamp, accepting the layouts the upstream APIs
/// actually emit.
///
/// Tries, in order: RFC 3339 with zone, `%Y-%m-%dT%H:%M:%S` and
/// `%Y-%m-%dT%H:%M` without zone (assumed UTC), and a bare date.
pub fn parse_timestamp(s: &str) -> NowcastResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(&format!("{s}T00:00:00"), "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(NowcastError::InvalidTimestamp(s.to_string()))
}

/// The truncated-hour alignment key for a timestamp string.
///
/// Returns `None` when the timestamp cannot be parsed; callers treat
/// such steps as alignment misses, not errors.
pub fn hour_key(s: &str) -> Option<String> {
    parse_timestamp(s).ok().map(|dt| hour_key_of(dt))
}

/// The truncated-hour alignment key for an already-parsed instant.
pub fn hour_key_of(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:00").to_string()
}

/// Resolve an instant to an index on a time axis by truncated-hour key.
pub fn index_for_instant(times: &[String], instant: DateTime<Utc>) -> Option<usize> {
    let wanted = hour_key_of(instant);
    times
        .iter()
        .position(|t| hour_key(t).as_deref() == Some(wanted.as_str()))
}
