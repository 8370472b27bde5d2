use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Canonical name given to the first column of every uploaded file.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// The raw text of one uploaded export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Display name, usually the file name without its directory.
    pub name: String,
    /// Full UTF-8 contents.
    pub content: String,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A file that could not be ingested, reported without halting the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub file_name: String,
    pub message: String,
}

/// Concatenated raw cells of all successfully parsed files.
///
/// `columns[0]` is always [`TIMESTAMP_COLUMN`]. Each row holds one cell per
/// column; `None` marks a column the row's source file did not have.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// A resolved timestamp plus the calendar parts derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeParts {
    pub timestamp: NaiveDateTime,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl From<NaiveDateTime> for TimeParts {
    fn from(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            year: timestamp.year(),
            month: timestamp.month(),
            day: timestamp.day(),
            hour: timestamp.hour(),
        }
    }
}

/// One row of the wide table: a timestamp and one cell per value column.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow<V> {
    pub time: TimeParts,
    pub values: Vec<Option<V>>,
}

/// Wide table with one column per meter. `V` is `String` before value
/// coercion and `f64` after.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable<V> {
    pub value_columns: Vec<String>,
    pub rows: Vec<WideRow<V>>,
}

impl<V> Default for WideTable<V> {
    fn default() -> Self {
        Self {
            value_columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// The canonical unit of analysis: one reading of one meter at one moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    pub timestamp: NaiveDateTime,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub category: String,
    pub value: Option<f64>,
}

impl LongRecord {
    pub fn new(time: TimeParts, category: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            timestamp: time.timestamp,
            year: time.year,
            month: time.month,
            day: time.day,
            hour: time.hour,
            category: category.into(),
            value,
        }
    }
}

/// Per-category idle offset subtracted by baseline correction.
pub type BaselineTable = BTreeMap<String, f64>;

// ── Granularity ───────────────────────────────────────────────────────────────

/// Level of the year → month → day → hour drill-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Year,
    Month,
    Day,
    Hour,
}

impl Granularity {
    /// Group key of `record` at this level.
    pub fn key_of(self, record: &LongRecord) -> i32 {
        match self {
            Granularity::Year => record.year,
            Granularity::Month => record.month as i32,
            Granularity::Day => record.day as i32,
            Granularity::Hour => record.hour as i32,
        }
    }

    /// Column heading used for the group key.
    pub fn label(self) -> &'static str {
        match self {
            Granularity::Year => "Year",
            Granularity::Month => "Month",
            Granularity::Day => "Day",
            Granularity::Hour => "Hour",
        }
    }
}

// ── FilterSelection ───────────────────────────────────────────────────────────

/// The user's current filter choices.
///
/// Time restrictions cascade: `month` only applies together with `year`, and
/// `day` only together with `year` and `month`. An empty `categories` set
/// selects every category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    /// Optional hour-of-day restriction; `None` keeps every hour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<BTreeSet<u32>>,
}

impl FilterSelection {
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn with_hours<I: IntoIterator<Item = u32>>(mut self, hours: I) -> Self {
        self.hours = Some(hours.into_iter().collect());
        self
    }

    /// The `(year, month, day)` restriction that actually applies after the
    /// cascade rule drops orphaned finer levels.
    pub fn effective_date(&self) -> (Option<i32>, Option<u32>, Option<u32>) {
        match (self.year, self.month, self.day) {
            (None, _, _) => (None, None, None),
            (Some(y), None, _) => (Some(y), None, None),
            (Some(y), Some(m), d) => (Some(y), Some(m), d),
        }
    }

    /// Chart level implied by the selection.
    pub fn granularity(&self) -> Granularity {
        match self.effective_date() {
            (None, _, _) => Granularity::Year,
            (Some(_), None, _) => Granularity::Month,
            (Some(_), Some(_), None) => Granularity::Day,
            (Some(_), Some(_), Some(_)) => Granularity::Hour,
        }
    }

    /// The same selection shifted one year back, or `None` at the top level
    /// and for the earliest representable year.
    pub fn previous_year(&self) -> Option<Self> {
        let year = self.year?;
        Some(Self {
            year: Some(year.checked_sub(1)?),
            ..self.clone()
        })
    }

    /// `true` when `record` passes every active restriction.
    pub fn matches(&self, record: &LongRecord) -> bool {
        if !self.categories.is_empty() && !self.categories.contains(&record.category) {
            return false;
        }
        let (year, month, day) = self.effective_date();
        if year.is_some_and(|y| y != record.year)
            || month.is_some_and(|m| m != record.month)
            || day.is_some_and(|d| d != record.day)
        {
            return false;
        }
        match &self.hours {
            Some(hours) => hours.contains(&record.hour),
            None => true,
        }
    }
}

// ── Aggregates ────────────────────────────────────────────────────────────────

/// Sum of one category's values within one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Year, month, day or hour depending on the [`Granularity`].
    pub key: i32,
    pub category: String,
    pub sum: f64,
}

/// Whether the current selection produced anything to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataState {
    Ready,
    NoData,
}
