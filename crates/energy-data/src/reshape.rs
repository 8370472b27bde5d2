//! Wide → long reshaping.

use energy_core::models::{LongRecord, WideTable};

/// Melt a wide table into one [`LongRecord`] per (row, value column).
///
/// Output is column-major: all rows of the first meter, then all rows of
/// the next. Time fields are copied unchanged and missing values stay
/// `None`, so the output length is always `rows × value columns`.
pub fn melt(table: &WideTable<f64>) -> Vec<LongRecord> {
    let mut records = Vec::with_capacity(table.rows.len() * table.value_columns.len());

    for (idx, category) in table.value_columns.iter().enumerate() {
        for row in &table.rows {
            let value = row.values.get(idx).copied().flatten();
            records.push(LongRecord::new(row.time, category.as_str(), value));
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::drop_columns;
    use chrono::NaiveDate;
    use energy_core::models::{TimeParts, WideRow};

    fn wide(columns: &[&str], rows: usize) -> WideTable<f64> {
        let rows = (0..rows)
            .map(|i| {
                let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(i as u32, 0, 0)
                    .unwrap();
                WideRow {
                    time: TimeParts::from(ts),
                    values: (0..columns.len())
                        .map(|c| if (i + c) % 3 == 0 { None } else { Some((i * 10 + c) as f64) })
                        .collect(),
                }
            })
            .collect();
        WideTable {
            value_columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_melt_cardinality() {
        for (cols, rows) in [(1, 1), (3, 7), (5, 24), (2, 0)] {
            let names: Vec<String> = (0..cols).map(|c| format!("Meter {c}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let table = wide(&refs, rows);
            assert_eq!(melt(&table).len(), cols * rows);
        }
    }

    #[test]
    fn test_melt_preserves_time_fields_and_nulls() {
        let table = wide(&["A", "B"], 3);
        let records = melt(&table);

        assert_eq!(records[0].category, "A");
        assert_eq!(records[0].hour, 0);
        assert_eq!(records[0].value, None);
        assert_eq!(records[1].hour, 1);
        assert_eq!(records[1].value, Some(10.0));
        assert_eq!(records[3].category, "B");
        assert_eq!(records[3].timestamp, table.rows[0].time.timestamp);
        assert_eq!(records[3].value, Some(1.0));
    }

    #[test]
    fn test_curation_commutes_with_melt() {
        let table = wide(&["A", "Dup", "B"], 6);

        let curated_first = melt(&drop_columns(table.clone(), &["Dup"]));
        let filtered_after: Vec<LongRecord> = melt(&table)
            .into_iter()
            .filter(|r| r.category != "Dup")
            .collect();

        assert_eq!(curated_first, filtered_after);
    }
}
