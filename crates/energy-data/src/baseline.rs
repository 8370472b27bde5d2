//! Idle-baseline estimation and subtraction.
//!
//! Cumulative meters often register a standby draw even when nothing runs.
//! The baseline of a meter is its mean reading during a low-activity window
//! (by default 00:00–04:59) on a small sample of days; subtracting it leaves
//! the "active" consumption.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use energy_core::models::{BaselineTable, WideRow, WideTable};
use energy_core::settings::BaselineConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

// ── BaselineEstimator ─────────────────────────────────────────────────────────

/// Computes per-meter baselines from a seeded sample of days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineEstimator {
    sample_days: usize,
    window_start_hour: u32,
    window_end_hour: u32,
}

impl BaselineEstimator {
    pub fn new(sample_days: usize, window_start_hour: u32, window_end_hour: u32) -> Self {
        Self {
            sample_days,
            window_start_hour,
            window_end_hour,
        }
    }

    pub fn from_config(config: &BaselineConfig) -> Self {
        Self::new(
            config.sample_days,
            config.window_start_hour,
            config.window_end_hour,
        )
    }

    /// Estimate baselines with a [`StdRng`] seeded from `seed`.
    pub fn estimate(&self, table: &WideTable<f64>, seed: u64) -> BaselineTable {
        let mut rng = StdRng::seed_from_u64(seed);
        self.estimate_with_rng(table, &mut rng)
    }

    /// Estimate baselines drawing the day sample from `rng`.
    ///
    /// Missing readings count as zero. A meter gets a baseline of zero when
    /// the sampled window holds no rows at all.
    pub fn estimate_with_rng<R: Rng + ?Sized>(
        &self,
        table: &WideTable<f64>,
        rng: &mut R,
    ) -> BaselineTable {
        let dates: BTreeSet<NaiveDate> = self.sample_dates(table, rng).into_iter().collect();

        let window: Vec<&WideRow<f64>> = table
            .rows
            .iter()
            .filter(|row| dates.contains(&row.time.timestamp.date()) && self.in_window(row))
            .collect();

        if window.is_empty() && !table.value_columns.is_empty() {
            warn!(
                sampled_days = dates.len(),
                "no readings in the baseline window; using zero baselines"
            );
        }

        let mut baselines = BaselineTable::new();
        for (idx, column) in table.value_columns.iter().enumerate() {
            let baseline = if window.is_empty() {
                0.0
            } else {
                let total: f64 = window
                    .iter()
                    .map(|row| row.values.get(idx).copied().flatten().unwrap_or(0.0))
                    .sum();
                total / window.len() as f64
            };
            baselines.insert(column.clone(), baseline);
        }

        debug!(
            sampled_days = dates.len(),
            window_rows = window.len(),
            "estimated baselines"
        );
        baselines
    }

    /// Up to `sample_days` distinct calendar dates drawn from `table`,
    /// returned in chronological order. All dates are used when there are
    /// fewer than requested.
    pub fn sample_dates<R: Rng + ?Sized>(&self, table: &WideTable<f64>, rng: &mut R) -> Vec<NaiveDate> {
        let distinct: Vec<NaiveDate> = table
            .rows
            .iter()
            .map(|row| row.time.timestamp.date())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut sampled: Vec<NaiveDate> = distinct
            .choose_multiple(rng, self.sample_days)
            .copied()
            .collect();
        sampled.sort();
        sampled
    }

    fn in_window(&self, row: &WideRow<f64>) -> bool {
        (self.window_start_hour..=self.window_end_hour).contains(&row.time.hour)
    }
}

// ── Subtraction ───────────────────────────────────────────────────────────────

/// Subtract each meter's baseline from every reading, flooring at zero.
///
/// Missing readings are treated as zero, so every cell of the result holds
/// a value. Meters without a baseline entry are left unshifted.
pub fn apply_baseline(table: WideTable<f64>, baselines: &BaselineTable) -> WideTable<f64> {
    let offsets: Vec<f64> = table
        .value_columns
        .iter()
        .map(|c| baselines.get(c).copied().unwrap_or(0.0))
        .collect();

    let rows = table
        .rows
        .into_iter()
        .map(|row| WideRow {
            time: row.time,
            values: row
                .values
                .into_iter()
                .zip(&offsets)
                .map(|(v, offset)| Some((v.unwrap_or(0.0) - offset).max(0.0)))
                .collect(),
        })
        .collect();

    WideTable {
        value_columns: table.value_columns,
        rows,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
