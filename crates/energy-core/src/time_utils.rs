use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::trace;

use crate::error::{DashboardError, Result};

/// Date-time layouts tried in order. ISO forms come first; slash and dash
/// dates with the year last are read day-first, as meter exports from
/// European portals write them.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Date-only layouts; these resolve to midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y"];

/// Drop a UTC-offset suffix: everything from the first `+`, and a trailing
/// `Z`. The remaining wall-clock text is kept as-is.
pub fn strip_offset(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_plus = match trimmed.find('+') {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };
    let without_plus = without_plus.trim_end();
    without_plus.strip_suffix('Z').unwrap_or(without_plus)
}

/// Parse an export timestamp into a timezone-naive date-time.
///
/// The offset is discarded, never applied: `2024-01-01T02:00:00+01:00`
/// resolves to `2024-01-01 02:00:00`. Returns `None` for empty or
/// unrecognised input.
pub fn parse_naive_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = strip_offset(raw);
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    // Negative offsets survive the `+` cut; keep their local wall clock.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_local());
    }

    trace!(raw, "unparseable timestamp");
    None
}

/// Like [`parse_naive_timestamp`] but reports the failing input.
pub fn resolve_timestamp(raw: &str) -> Result<NaiveDateTime> {
    parse_naive_timestamp(raw).ok_or_else(|| DashboardError::TimestampParse(raw.to_string()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    // ── strip_offset ─────────────────────────────────────────────────────────

    #[test]
    fn test_strip_offset_plus_suffix() {
        assert_eq!(strip_offset("2024-01-01T02:00:00+01:00"), "2024-01-01T02:00:00");
    }

    #[test]
    fn test_strip_offset_z_suffix() {
        assert_eq!(strip_offset("2024-01-01T02:00:00Z"), "2024-01-01T02:00:00");
    }

    #[test]
    fn test_strip_offset_without_suffix() {
        assert_eq!(strip_offset("  2024-01-01 02:00  "), "2024-01-01 02:00");
    }

    // ── parse_naive_timestamp ────────────────────────────────────────────────

    #[test]
    fn test_parse_keeps_wall_clock_of_positive_offset() {
        let dt = parse_naive_timestamp("2024-01-01T02:00:00+01:00").unwrap();
        assert_eq!(dt, ymd_hms(2024, 1, 1, 2, 0, 0));
    }

    #[test]
    fn test_parse_keeps_wall_clock_of_negative_offset() {
        let dt = parse_naive_timestamp("2024-07-04T18:30:00-05:00").unwrap();
        assert_eq!(dt, ymd_hms(2024, 7, 4, 18, 30, 0));
    }

    #[test]
    fn test_parse_space_separated() {
        let dt = parse_naive_timestamp("2023-12-31 23:15:00").unwrap();
        assert_eq!(dt, ymd_hms(2023, 12, 31, 23, 15, 0));
    }

    #[test]
    fn test_parse_without_seconds() {
        let dt = parse_naive_timestamp("2023-12-31 23:15").unwrap();
        assert_eq!(dt.minute(), 15);
        assert_eq!(dt.second(), 0);
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = parse_naive_timestamp("2024-02-29T12:00:00.250+00:00").unwrap();
        assert_eq!(dt.day(), 29);
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_parse_day_first() {
        let dt = parse_naive_timestamp("05/03/2024 07:00").unwrap();
        assert_eq!((dt.day(), dt.month()), (5, 3));
        let dt = parse_naive_timestamp("13-01-2024 00:00:00").unwrap();
        assert_eq!((dt.day(), dt.month()), (13, 1));
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        let dt = parse_naive_timestamp("2024-06-01").unwrap();
        assert_eq!(dt, ymd_hms(2024, 6, 1, 0, 0, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_naive_timestamp("").is_none());
        assert!(parse_naive_timestamp("totaal").is_none());
        assert!(parse_naive_timestamp("+01:00").is_none());
        assert!(parse_naive_timestamp("2024-13-45 10:00").is_none());
    }

    #[test]
    fn test_resolve_timestamp_error_carries_input() {
        let err = resolve_timestamp("nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid timestamp format: nope");
    }
}
