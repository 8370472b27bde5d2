use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

// ── ValueCoercer ──────────────────────────────────────────────────────────────

/// Turns meter cells such as `"123,45 kWh"` into numbers.
///
/// The first run of digits, dots and commas is taken and any unit label is
/// ignored. A comma is read as the decimal separator. A run containing both
/// `.` and `,` is ambiguous (`1.234,56` could be a thousands separator or a
/// stray comma) and yields `None`, as does anything that does not parse.
pub struct ValueCoercer;

impl ValueCoercer {
    /// Coerce an optional raw cell; a missing cell is `None`.
    pub fn coerce(cell: Option<&str>) -> Option<f64> {
        cell.and_then(Self::parse)
    }

    /// Coerce a single raw cell.
    pub fn parse(cell: &str) -> Option<f64> {
        let numeral = Self::extract_numeral(cell)?;

        if numeral.contains('.') && numeral.contains(',') {
            trace!(cell, "mixed decimal separators");
            return None;
        }

        let normalised = numeral.replace(',', ".");
        match normalised.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                trace!(cell, "malformed numeral");
                None
            }
        }
    }

    /// The first `[0-9.,]+` substring of `cell`, if any.
    pub fn extract_numeral(cell: &str) -> Option<&str> {
        numeral_pattern().find(cell).map(|m| m.as_str())
    }
}

fn numeral_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9.,]+").expect("regex is valid"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
