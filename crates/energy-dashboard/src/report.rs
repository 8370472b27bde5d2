//! Plain-text rendering of a [`DashboardView`].
//!
//! The chart is shown as a pivot table with one row per group key and one
//! column per meter, followed by a totals row, the previous-year series,
//! per-meter means, the record preview and any files that were skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use energy_core::formatting::{format_number, format_value, month_name, round_to};
use energy_core::models::{AggregateRow, DataState, Granularity};
use energy_data::analysis::DashboardView;
use unicode_width::UnicodeWidthStr;

// ── TextTable ─────────────────────────────────────────────────────────────────

/// Column-aligned text table. The first column is left-aligned, the rest
/// right-aligned.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Index of the row drawn below a separator line.
    totals: Option<usize>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn push_totals(&mut self, row: Vec<String>) {
        self.totals = Some(self.rows.len());
        self.rows.push(row);
    }

    /// Render with display widths, so wide and combining characters in
    /// meter names keep columns aligned.
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.width());
                }
            }
        }

        let mut out = String::new();
        out.push_str(&render_line(&self.headers, &widths));
        out.push_str(&separator(&widths));
        for (i, row) in self.rows.iter().enumerate() {
            if self.totals == Some(i) {
                out.push_str(&separator(&widths));
            }
            out.push_str(&render_line(row, &widths));
        }
        out
    }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let pad = " ".repeat(width.saturating_sub(cell.width()));
        if i > 0 {
            line.push_str("  ");
        }
        if i == 0 {
            line.push_str(cell);
            line.push_str(&pad);
        } else {
            line.push_str(&pad);
            line.push_str(cell);
        }
    }
    line.truncate(line.trim_end().len());
    line.push('\n');
    line
}

fn separator(widths: &[usize]) -> String {
    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    format!("{}\n", "-".repeat(total))
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Label of a group key as shown on the chart axis.
pub fn key_label(granularity: Granularity, key: i32) -> String {
    match granularity {
        Granularity::Month => u32::try_from(key)
            .ok()
            .and_then(month_name)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string()),
        Granularity::Hour => format!("{key:02}:00"),
        Granularity::Year | Granularity::Day => key.to_string(),
    }
}

/// Pivot a series into a key × meter table with a totals row.
pub fn series_table(series: &[AggregateRow], granularity: Granularity) -> TextTable {
    let categories: BTreeSet<&str> = series.iter().map(|r| r.category.as_str()).collect();
    let mut by_key: BTreeMap<i32, BTreeMap<&str, f64>> = BTreeMap::new();
    for row in series {
        by_key
            .entry(row.key)
            .or_default()
            .insert(row.category.as_str(), row.sum);
    }

    let mut table = TextTable::new(
        std::iter::once(granularity.label()).chain(categories.iter().copied()),
    );
    for (key, sums) in &by_key {
        let mut cells = vec![key_label(granularity, *key)];
        cells.extend(
            categories
                .iter()
                .map(|c| format_value(sums.get(c).copied())),
        );
        table.push_row(cells);
    }

    if !by_key.is_empty() {
        let mut totals = vec!["Total".to_string()];
        totals.extend(categories.iter().map(|c| {
            let sum: f64 = series
                .iter()
                .filter(|r| r.category == *c)
                .map(|r| r.sum)
                .sum();
            format_number(sum, 2)
        }));
        table.push_totals(totals);
    }
    table
}

/// Human description of the active selection, e.g. `March 2024`.
pub fn selection_title(view: &DashboardView) -> String {
    let (year, month, day) = view.selection.effective_date();
    let period = match (year, month, day) {
        (None, _, _) => "All years".to_string(),
        (Some(y), None, _) => y.to_string(),
        (Some(y), Some(m), None) => format!("{} {y}", month_name(m).unwrap_or("?")),
        (Some(y), Some(m), Some(d)) => format!("{d} {} {y}", month_name(m).unwrap_or("?")),
    };

    let meters = if view.selection.categories.is_empty() {
        "all meters".to_string()
    } else {
        view.selection
            .categories
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{period}, {meters}, by {}", view.granularity.label().to_lowercase())
}

/// Render the whole view as text.
pub fn render(view: &DashboardView) -> String {
    let mut out = String::new();
    let meta = &view.metadata;

    let _ = writeln!(out, "{}", selection_title(view));
    let _ = writeln!(
        out,
        "{} file(s) loaded, {} row(s) read, {} dropped for unreadable timestamps",
        meta.files_loaded, meta.rows_read, meta.rows_dropped
    );

    if !view.file_errors.is_empty() {
        let _ = writeln!(out, "\nSkipped files:");
        for error in &view.file_errors {
            let _ = writeln!(out, "  {}: {}", error.file_name, error.message);
        }
    }

    if view.state == DataState::NoData {
        let _ = writeln!(out, "\nNo data for this selection.");
        if !view.options.years.is_empty() {
            let years: Vec<String> = view.options.years.iter().map(i32::to_string).collect();
            let _ = writeln!(out, "Available years: {}", years.join(", "));
        }
        return out;
    }

    let _ = writeln!(out, "\nTotal per {}", view.granularity.label().to_lowercase());
    out.push_str(&series_table(&view.series, view.granularity).render());

    let previous_year = view.selection.previous_year().and_then(|s| s.year);
    if let (Some(previous), Some(year)) = (&view.previous_year, previous_year) {
        let _ = writeln!(out, "\nPrevious year ({year})");
        if previous.is_empty() {
            let _ = writeln!(out, "No data for {year}.");
        } else {
            out.push_str(&series_table(previous, view.granularity).render());
        }
    }

    let _ = writeln!(out, "\nMean per meter");
    let mut means = TextTable::new(["Meter", "Mean"]);
    for (category, mean) in &view.means {
        means.push_row(vec![category.clone(), format_value(mean.map(|m| round_to(m, 2)))]);
    }
    out.push_str(&means.render());

    if let Some(baselines) = &view.baselines {
        let _ = writeln!(out, "\nSubtracted baselines");
        let mut table = TextTable::new(["Meter", "Baseline"]);
        for (category, baseline) in baselines {
            table.push_row(vec![category.clone(), format_number(*baseline, 2)]);
        }
        out.push_str(&table.render());
    }

    if !view.preview.is_empty() {
        let _ = writeln!(
            out,
            "\nRecords (first {} of {})",
            view.preview.len(),
            view.records.len()
        );
        let mut preview = TextTable::new(["Timestamp", "Meter", "Value"]);
        for record in &view.preview {
            preview.push_row(vec![
                record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                record.category.clone(),
                format_value(record.value),
            ]);
        }
        out.push_str(&preview.render());
    }

    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use energy_core::models::{FilterSelection, UploadedFile};
    use energy_core::settings::DashboardConfig;
    use energy_data::analysis::compute;

    fn files() -> Vec<UploadedFile> {
        vec![UploadedFile::new(
            "meters.csv",
            "Timestamp,Zähler,Grid\n\
             2023-03-01 10:00,1,2\n\
             2024-03-01 10:00,1234.5,2\n\
             2024-03-02 11:00,,3\n\
             2024-04-01 00:00,5,1\n",
        )]
    }

    #[test]
    fn test_text_table_aligns_by_display_width() {
        let mut table = TextTable::new(["Meter", "Value"]);
        table.push_row(vec!["Zähler".into(), "1.00".into()]);
        table.push_row(vec!["日本".into(), "10.00".into()]);
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "Meter   Value");
        assert_eq!(lines[2], "Zähler   1.00");
        assert_eq!(lines[3], "日本    10.00");
    }

    #[test]
    fn test_key_label() {
        assert_eq!(key_label(Granularity::Month, 3), "March");
        assert_eq!(key_label(Granularity::Month, 13), "13");
        assert_eq!(key_label(Granularity::Hour, 7), "07:00");
        assert_eq!(key_label(Granularity::Year, 2024), "2024");
    }

    #[test]
    fn test_series_table_pivots_with_totals() {
        let series = vec![
            AggregateRow { key: 3, category: "A".into(), sum: 1234.5 },
            AggregateRow { key: 3, category: "B".into(), sum: 1.0 },
            AggregateRow { key: 4, category: "A".into(), sum: 5.0 },
        ];
        let rendered = series_table(&series, Granularity::Month).render();

        assert!(rendered.contains("March"));
        assert!(rendered.contains("1,234.50"));
        assert!(rendered.lines().any(|l| l.starts_with("April") && l.ends_with('-')));
        assert!(rendered.lines().any(|l| l.starts_with("Total") && l.contains("1,239.50")));
    }

    #[test]
    fn test_render_month_view() {
        let sel = FilterSelection::default().with_year(2024);
        let view = compute(&files(), &DashboardConfig::default(), &sel);
        let text = render(&view);

        assert!(text.starts_with("2024, all meters, by month"));
        assert!(text.contains("Total per month"));
        assert!(text.contains("Previous year (2023)"));
        assert!(text.contains("Mean per meter"));
        assert!(text.contains("Records (first 6 of 6)"));
        assert!(!text.contains("Subtracted baselines"));
    }

    #[test]
    fn test_render_no_data() {
        let sel = FilterSelection::default().with_year(1990);
        let view = compute(&files(), &DashboardConfig::default(), &sel);
        let text = render(&view);

        assert!(text.contains("No data for this selection."));
        assert!(text.contains("Available years: 2023, 2024"));
        assert!(!text.contains("Mean per meter"));
    }

    #[test]
    fn test_render_earliest_year_has_no_previous_year() {
        let sel = FilterSelection::default().with_year(i32::MIN);
        let view = compute(&files(), &DashboardConfig::default(), &sel);
        assert!(view.previous_year.is_none());
        assert!(render(&view).contains("No data for this selection."));
    }

    #[test]
    fn test_render_lists_skipped_files_and_baselines() {
        let mut files = files();
        files.push(UploadedFile::new("broken.csv", ""));
        let mut config = DashboardConfig::default();
        config.baseline.enabled = true;

        let view = compute(&files, &config, &FilterSelection::default());
        let text = render(&view);

        assert!(text.contains("Skipped files:\n  broken.csv: File is empty"));
        assert!(text.contains("Subtracted baselines"));
    }
}
