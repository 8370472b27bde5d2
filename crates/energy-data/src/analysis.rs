//! End-to-end pipeline for the energy dashboard.
//!
//! [`prepare`] runs ingestion through reshaping and yields the cleaned
//! long-form dataset; [`view`] applies a filter selection to it. [`compute`]
//! chains both and is what an interaction controller calls on every change.

use std::collections::BTreeMap;

use energy_core::models::{
    AggregateRow, BaselineTable, DataState, FileError, FilterSelection, Granularity, LongRecord,
    UploadedFile,
};
use energy_core::settings::DashboardConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregator::{Aggregator, FilterOptions};
use crate::baseline::{apply_baseline, BaselineEstimator};
use crate::curation::drop_columns;
use crate::normalize::{coerce_values, resolve_timestamps};
use crate::reader::ingest;
use crate::reshape::melt;

// ── Public types ──────────────────────────────────────────────────────────────

/// Counters describing one run of [`prepare`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineMetadata {
    /// Files that parsed successfully.
    pub files_loaded: usize,
    /// Data rows read across all parsed files.
    pub rows_read: usize,
    /// Rows discarded because their timestamp did not parse.
    pub rows_dropped: usize,
    /// Meter columns remaining after curation.
    pub value_columns: usize,
    /// Long-form records produced.
    pub records: usize,
}

/// The cleaned dataset every filter interaction works on.
#[derive(Debug, Clone, Default)]
pub struct PreparedDataset {
    pub records: Vec<LongRecord>,
    /// Meter names in column order.
    pub categories: Vec<String>,
    pub file_errors: Vec<FileError>,
    /// Present when baseline correction ran.
    pub baselines: Option<BaselineTable>,
    pub metadata: PipelineMetadata,
}

/// Everything the presentation layer needs for one redraw.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub granularity: Granularity,
    pub selection: FilterSelection,
    pub state: DataState,
    /// Filtered records in chronological order.
    pub records: Vec<LongRecord>,
    /// Leading slice of `records` for the tabular preview.
    pub preview: Vec<LongRecord>,
    pub series: Vec<AggregateRow>,
    /// Same series one year earlier; `None` at the top level.
    pub previous_year: Option<Vec<AggregateRow>>,
    pub means: BTreeMap<String, Option<f64>>,
    pub options: FilterOptions,
    pub file_errors: Vec<FileError>,
    pub baselines: Option<BaselineTable>,
    pub metadata: PipelineMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run ingestion through reshaping, seeding the baseline sample from the
/// configuration.
pub fn prepare(files: &[UploadedFile], config: &DashboardConfig) -> PreparedDataset {
    let mut rng = StdRng::seed_from_u64(config.baseline.seed);
    prepare_with_rng(files, config, &mut rng)
}

/// Same as [`prepare`] with an explicit random source for the baseline
/// day sample.
///
/// 1. Parse and concatenate the files.
/// 2. Resolve timestamps, dropping rows that fail.
/// 3. Remove denylisted columns.
/// 4. Coerce cells to numbers.
/// 5. Optionally estimate and subtract the idle baseline.
/// 6. Melt to long form.
pub fn prepare_with_rng<R: Rng + ?Sized>(
    files: &[UploadedFile],
    config: &DashboardConfig,
    rng: &mut R,
) -> PreparedDataset {
    // ── Step 1: Ingest ────────────────────────────────────────────────────────
    let ingested = ingest(files);
    let rows_read = ingested.table.rows.len();

    // ── Step 2: Timestamps ────────────────────────────────────────────────────
    let resolved = resolve_timestamps(ingested.table);

    // ── Step 3: Curation ──────────────────────────────────────────────────────
    let curated = drop_columns(resolved.table, config.denylist.as_slice());

    // ── Step 4: Coercion ──────────────────────────────────────────────────────
    let mut wide = coerce_values(curated);

    // ── Step 5: Baseline ──────────────────────────────────────────────────────
    let baselines = if config.baseline.enabled {
        let estimator = BaselineEstimator::from_config(&config.baseline);
        let table = estimator.estimate_with_rng(&wide, rng);
        wide = apply_baseline(wide, &table);
        Some(table)
    } else {
        None
    };

    // ── Step 6: Reshape ───────────────────────────────────────────────────────
    let records = melt(&wide);

    let metadata = PipelineMetadata {
        files_loaded: ingested.files_loaded,
        rows_read,
        rows_dropped: resolved.rows_dropped,
        value_columns: wide.value_columns.len(),
        records: records.len(),
    };
    info!(
        files = metadata.files_loaded,
        rows = rows_read - metadata.rows_dropped,
        dropped = metadata.rows_dropped,
        records = metadata.records,
        baseline = baselines.is_some(),
        "prepared dataset"
    );

    PreparedDataset {
        categories: wide.value_columns,
        records,
        file_errors: ingested.file_errors,
        baselines,
        metadata,
    }
}

/// Apply `selection` to a prepared dataset.
///
/// An empty filtered set is reported as [`DataState::NoData`], not as an
/// error.
pub fn view(
    dataset: &PreparedDataset,
    selection: &FilterSelection,
    preview_rows: usize,
) -> DashboardView {
    let granularity = selection.granularity();
    let records = Aggregator::filter(&dataset.records, selection);
    let series = Aggregator::aggregate(&records, granularity);
    let previous_year = Aggregator::previous_year(&dataset.records, selection);
    let means = Aggregator::category_means(&records);
    let options = Aggregator::options(&dataset.records, selection);

    let state = if records.is_empty() {
        DataState::NoData
    } else {
        DataState::Ready
    };
    debug!(
        ?granularity,
        records = records.len(),
        groups = series.len(),
        ?state,
        "computed view"
    );

    DashboardView {
        granularity,
        selection: selection.clone(),
        state,
        preview: records.iter().take(preview_rows).cloned().collect(),
        records,
        series,
        previous_year,
        means,
        options,
        file_errors: dataset.file_errors.clone(),
        baselines: dataset.baselines.clone(),
        metadata: dataset.metadata.clone(),
    }
}

/// Stateless full recomputation: files and filters in, view out.
pub fn compute(
    files: &[UploadedFile],
    config: &DashboardConfig,
    selection: &FilterSelection,
) -> DashboardView {
    let dataset = prepare(files, config);
    view(&dataset, selection, config.preview_rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
