//! Temporal normalization: canonical UTC hours and the cutoff filter.
//!
//! Every extract gets the same treatment: timestamps become hour-truncated
//! UTC instants, and rows with an unparseable timestamp or an instant
//! before the cutoff are dropped. Applying the pass twice changes nothing.

use crate::extract::Extracts;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a timestamp string leniently. Returns `None` when no known format
/// matches; the caller keeps the row and lets the cutoff filter drop it.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive datetimes are taken as UTC.
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// Truncate an instant to the start of its containing hour.
pub fn floor_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    let floored = secs - secs.rem_euclid(3600);
    DateTime::from_timestamp(floored, 0).unwrap_or(ts)
}

/// Normalize all four extracts in place: floor every timestamp to its hour,
/// then drop rows whose timestamp is null or earlier than `cutoff`. A row
/// exactly at the cutoff survives. Empty extracts pass through unchanged.
pub fn apply(extracts: &mut Extracts, cutoff: DateTime<Utc>) {
    for row in &mut extracts.quotes.rows {
        row.timestamp = row.timestamp.map(floor_hour);
    }
    extracts.quotes.rows.retain(|r| keeps(r.timestamp, cutoff));

    for row in &mut extracts.bars.rows {
        row.timestamp = row.timestamp.map(floor_hour);
    }
    extracts.bars.rows.retain(|r| keeps(r.timestamp, cutoff));

    for ts in &mut extracts.trends.timestamps {
        *ts = ts.map(floor_hour);
    }
    let keep: Vec<bool> = extracts
        .trends
        .timestamps
        .iter()
        .map(|ts| keeps(*ts, cutoff))
        .collect();
    extracts.trends.retain_rows(&keep);

    for row in &mut extracts.fred.rows {
        row.timestamp = row.timestamp.map(floor_hour);
    }
    extracts.fred.rows.retain(|r| keeps(r.timestamp, cutoff));
}

fn keeps(ts: Option<DateTime<Utc>>, cutoff: DateTime<Utc>) -> bool {
    matches!(ts, Some(t) if t >= cutoff)
}
