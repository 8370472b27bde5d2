//! Filtering and grouped sums over the long-form dataset.
//!
//! Every call works on an immutable slice of [`LongRecord`]s and returns
//! fresh results; nothing is cached between interactions.

use std::collections::{BTreeMap, BTreeSet};

use energy_core::models::{AggregateRow, FilterSelection, Granularity, LongRecord};
use serde::Serialize;

// ── FilterOptions ─────────────────────────────────────────────────────────────

/// Values the user can pick from at the current drill-down depth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub years: Vec<i32>,
    /// Months present in the selected year (empty without a year).
    pub months: Vec<u32>,
    /// Days present in the selected month (empty without a month).
    pub days: Vec<u32>,
    /// Hours present within the selected year, month and day.
    pub hours: Vec<u32>,
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Stateless helper that filters and groups long-form records.
pub struct Aggregator;

impl Aggregator {
    /// Records passing `selection`, in chronological order.
    ///
    /// The sort is stable, so records sharing a timestamp keep their
    /// relative (column-major) order.
    pub fn filter(records: &[LongRecord], selection: &FilterSelection) -> Vec<LongRecord> {
        let mut filtered: Vec<LongRecord> = records
            .iter()
            .filter(|r| selection.matches(r))
            .cloned()
            .collect();
        filtered.sort_by_key(|r| r.timestamp);
        filtered
    }

    /// Sum of `value` per (group key, category), ordered by key then
    /// category.
    ///
    /// Missing values add nothing, so a group whose values are all missing
    /// sums to zero; keys without any record do not appear.
    pub fn aggregate(records: &[LongRecord], granularity: Granularity) -> Vec<AggregateRow> {
        let mut sums: BTreeMap<(i32, &str), f64> = BTreeMap::new();

        for record in records {
            let key = granularity.key_of(record);
            *sums.entry((key, record.category.as_str())).or_insert(0.0) +=
                record.value.unwrap_or(0.0);
        }

        sums.into_iter()
            .map(|((key, category), sum)| AggregateRow {
                key,
                category: category.to_string(),
                sum,
            })
            .collect()
    }

    /// Filter then aggregate at the selection's own granularity.
    pub fn aggregate_selection(
        records: &[LongRecord],
        selection: &FilterSelection,
    ) -> Vec<AggregateRow> {
        let filtered = Self::filter(records, selection);
        Self::aggregate(&filtered, selection.granularity())
    }

    /// The same series for the year before the selected one.
    ///
    /// Computed independently from the current year's rows. `None` when no
    /// year is selected.
    pub fn previous_year(
        records: &[LongRecord],
        selection: &FilterSelection,
    ) -> Option<Vec<AggregateRow>> {
        let previous = selection.previous_year()?;
        let filtered = Self::filter(records, &previous);
        Some(Self::aggregate(&filtered, selection.granularity()))
    }

    /// Mean value per category, ignoring missing values. A category whose
    /// values are all missing maps to `None`.
    pub fn category_means(records: &[LongRecord]) -> BTreeMap<String, Option<f64>> {
        let mut acc: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

        for record in records {
            let entry = acc.entry(record.category.as_str()).or_insert((0.0, 0));
            if let Some(v) = record.value {
                entry.0 += v;
                entry.1 += 1;
            }
        }

        acc.into_iter()
            .map(|(category, (sum, n))| {
                let mean = (n > 0).then(|| sum / n as f64);
                (category.to_string(), mean)
            })
            .collect()
    }

    /// Available filter values given the current selection.
    pub fn options(records: &[LongRecord], selection: &FilterSelection) -> FilterOptions {
        let (year, month, day) = selection.effective_date();

        let mut categories = BTreeSet::new();
        let mut years = BTreeSet::new();
        let mut months = BTreeSet::new();
        let mut days = BTreeSet::new();
        let mut hours = BTreeSet::new();

        for r in records {
            categories.insert(r.category.as_str());
            years.insert(r.year);
            let in_date = year.map_or(true, |y| y == r.year)
                && month.map_or(true, |m| m == r.month)
                && day.map_or(true, |d| d == r.day);
            if in_date {
                hours.insert(r.hour);
            }
            if year == Some(r.year) {
                months.insert(r.month);
                if month == Some(r.month) {
                    days.insert(r.day);
                }
            }
        }

        FilterOptions {
            categories: categories.into_iter().map(str::to_string).collect(),
            years: years.into_iter().collect(),
            months: months.into_iter().collect(),
            days: days.into_iter().collect(),
            hours: hours.into_iter().collect(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
