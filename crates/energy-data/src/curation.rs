//! Removal of known-bad meter columns.

use energy_core::models::WideTable;
use tracing::debug;

/// Drop every value column whose name exactly equals a denylist entry.
///
/// Entries that match no column are ignored. Works on any cell type so it
/// can run before or after value coercion.
pub fn drop_columns<V, S: AsRef<str>>(table: WideTable<V>, denylist: &[S]) -> WideTable<V> {
    let keep: Vec<bool> = table
        .value_columns
        .iter()
        .map(|c| !denylist.iter().any(|d| d.as_ref() == c))
        .collect();

    if keep.iter().all(|&k| k) {
        return table;
    }

    let value_columns: Vec<String> = table
        .value_columns
        .into_iter()
        .zip(&keep)
        .filter_map(|(c, &k)| k.then_some(c))
        .collect();
    debug!(
        removed = keep.len() - value_columns.len(),
        remaining = value_columns.len(),
        "curated columns"
    );

    let rows = table
        .rows
        .into_iter()
        .map(|mut row| {
            let mut flags = keep.iter();
            row.values.retain(|_| flags.next().copied().unwrap_or(true));
            row
        })
        .collect();

    WideTable {
        value_columns,
        rows,
    }
}
