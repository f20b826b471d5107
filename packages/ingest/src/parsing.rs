//! Shared parsing utilities for field-collected CSV data.
//!
//! Field data is messy: blank cells, free-text placeholders, dates in a
//! handful of day-first formats. Every parser here returns `Option` so a
//! malformed cell becomes a missing value rather than an error;
//! downstream aggregation excludes missing values explicitly.

use chrono::NaiveDate;

/// Parses a unix timestamp cell. Accepts integer and float renderings
/// (spreadsheet exports often write `1717027200.0`).
#[must_use]
pub fn parse_unix_time(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    trimmed.parse::<f64>().ok().and_then(|v| {
        if v.is_finite() {
            #[allow(clippy::cast_possible_truncation)]
            Some(v.trunc() as i64)
        } else {
            None
        }
    })
}

/// Parses a day-first date cell (`30.05.2024` or `30/05/2024`).
#[must_use]
pub fn parse_date_dmy(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}

/// Converts a day-first date cell to unix seconds at midnight UTC.
#[must_use]
pub fn parse_date_dmy_unix(s: &str) -> Option<i64> {
    parse_date_dmy(s)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// Parses a numeric cell to a finite float. Returns `None` if missing,
/// unparseable, or non-finite.
#[must_use]
pub fn parse_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a latitude/longitude pair. Returns `None` if either half is
/// missing or non-finite.
#[must_use]
pub fn parse_lat_lon(lat: &str, lon: &str) -> Option<(f64, f64)> {
    Some((parse_f64(lat)?, parse_f64(lon)?))
}
