//! Row-level normalization of the concatenated raw table.
//!
//! Turns [`RawTable`] into a [`WideTable`] keyed by a resolved timestamp,
//! then coerces the text cells into numbers.

use energy_core::data_processors::ValueCoercer;
use energy_core::models::{RawTable, TimeParts, WideRow, WideTable};
use energy_core::time_utils::resolve_timestamp;
use tracing::{debug, trace};

/// A wide table plus the number of rows whose timestamp did not parse.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTable {
    pub table: WideTable<String>,
    pub rows_dropped: usize,
}

/// Resolve the first column of every row to a naive timestamp.
///
/// Rows whose timestamp is missing or unparseable are dropped silently and
/// counted in [`ResolvedTable::rows_dropped`].
pub fn resolve_timestamps(raw: RawTable) -> ResolvedTable {
    let value_columns: Vec<String> = raw.columns.into_iter().skip(1).collect();
    let mut rows = Vec::with_capacity(raw.rows.len());
    let mut rows_dropped = 0usize;

    for row in raw.rows {
        let mut cells = row.into_iter();
        let raw_timestamp = cells.next().flatten().unwrap_or_default();

        match resolve_timestamp(&raw_timestamp) {
            Ok(ts) => rows.push(WideRow {
                time: TimeParts::from(ts),
                values: cells.collect(),
            }),
            Err(e) => {
                trace!(error = %e, "dropping row");
                rows_dropped += 1;
            }
        }
    }

    if rows_dropped > 0 {
        debug!(rows_dropped, "dropped rows with unparseable timestamps");
    }

    ResolvedTable {
        table: WideTable {
            value_columns,
            rows,
        },
        rows_dropped,
    }
}

/// Convert every value cell to a number; unparseable cells become `None`
/// and the row is kept.
pub fn coerce_values(table: WideTable<String>) -> WideTable<f64> {
    let rows = table
        .rows
        .into_iter()
        .map(|row| WideRow {
            time: row.time,
            values: row
                .values
                .iter()
                .map(|cell| ValueCoercer::coerce(cell.as_deref()))
                .collect(),
        })
        .collect();

    WideTable {
        value_columns: table.value_columns,
        rows,
    }
}
