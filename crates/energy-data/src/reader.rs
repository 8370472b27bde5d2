//! CSV discovery, delimiter detection and ingestion.
//!
//! Each uploaded export is parsed on its own; a file that fails is reported
//! as a [`FileError`] and left out, while the rest are concatenated by
//! column name into one [`RawTable`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use energy_core::error::{DashboardError, Result};
use energy_core::models::{FileError, RawTable, UploadedFile, TIMESTAMP_COLUMN};
use tracing::{debug, info, warn};

/// Candidate delimiters in order of preference when counts tie.
const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Number of non-empty lines inspected by [`detect_delimiter`].
const SNIFF_LINES: usize = 10;

// ── Public types ──────────────────────────────────────────────────────────────

/// Combined table plus the files that could not be parsed.
#[derive(Debug, Clone, Default)]
pub struct IngestResult {
    pub table: RawTable,
    pub file_errors: Vec<FileError>,
    pub files_loaded: usize,
}

/// Files read from disk, plus the paths that could not be read.
#[derive(Debug, Clone, Default)]
pub struct LoadedFiles {
    pub files: Vec<UploadedFile>,
    pub errors: Vec<FileError>,
}

// ── Disk loading ──────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `dir`, sorted by path.
pub fn find_csv_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Data path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read every path (files, or directories scanned for CSV files) into
/// memory. Unreadable and non-UTF-8 files are reported, not fatal.
pub fn load_files(paths: &[PathBuf]) -> LoadedFiles {
    let mut loaded = LoadedFiles::default();

    for path in paths {
        let candidates = if path.is_dir() {
            find_csv_files(path)
        } else {
            vec![path.clone()]
        };

        for file_path in candidates {
            match read_file(&file_path) {
                Ok(file) => loaded.files.push(file),
                Err(e) => {
                    warn!(file = %file_path.display(), error = %e, "skipping file");
                    loaded.errors.push(FileError {
                        file_name: display_name(&file_path),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    debug!(
        files = loaded.files.len(),
        errors = loaded.errors.len(),
        "loaded input files"
    );
    loaded
}

fn read_file(path: &Path) -> Result<UploadedFile> {
    let bytes = std::fs::read(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let content =
        String::from_utf8(bytes).map_err(|_| DashboardError::InvalidEncoding(path.to_path_buf()))?;
    Ok(UploadedFile::new(display_name(path), content))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Ingestion ─────────────────────────────────────────────────────────────────

/// Parse every file and concatenate the successes by column name.
///
/// The unified column list is the union of all headers in order of first
/// appearance, with [`TIMESTAMP_COLUMN`] first. Cells for columns a file
/// does not have are `None`.
pub fn ingest(files: &[UploadedFile]) -> IngestResult {
    let mut tables = Vec::with_capacity(files.len());
    let mut file_errors = Vec::new();

    for file in files {
        match parse_file(file) {
            Ok(table) => {
                debug!(
                    file = %file.name,
                    columns = table.columns.len(),
                    rows = table.rows.len(),
                    "parsed file"
                );
                tables.push(table);
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "failed to parse file");
                file_errors.push(FileError {
                    file_name: file.name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    let files_loaded = tables.len();
    let table = concat_tables(tables);
    info!(
        files = files_loaded,
        failed = file_errors.len(),
        rows = table.rows.len(),
        columns = table.columns.len(),
        "ingested uploads"
    );

    IngestResult {
        table,
        file_errors,
        files_loaded,
    }
}

/// Parse one file with its detected delimiter.
///
/// Headers are trimmed and the first column is renamed to
/// [`TIMESTAMP_COLUMN`]. Rows shorter than the header are padded with
/// missing cells, so a footer line simply fails timestamp resolution later;
/// a row longer than the header fails the whole file.
pub fn parse_file(file: &UploadedFile) -> Result<RawTable> {
    let delimiter = detect_delimiter(&file.content)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file.content.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(DashboardError::EmptyFile);
    }
    let columns = normalize_headers(headers.iter());
    let width = columns.len();

    let mut rows = Vec::new();
    let mut padded = 0usize;
    for record in reader.records() {
        let record = record?;
        if record.len() > width {
            return Err(DashboardError::TooManyFields {
                line: record.position().map_or(0, |p| p.line()),
                found: record.len(),
                expected: width,
            });
        }
        let mut row: Vec<Option<String>> = record.iter().map(|cell| Some(cell.to_string())).collect();
        if row.len() < width {
            padded += 1;
            row.resize(width, None);
        }
        rows.push(row);
    }

    if padded > 0 {
        debug!(file = %file.name, padded, "padded short rows");
    }
    Ok(RawTable { columns, rows })
}

/// Pick the field delimiter among comma, semicolon and tab.
///
/// The header line decides: a candidate must occur in it (outside double
/// quotes). When several do, the one whose header count is repeated on the
/// most of the following sampled lines wins, then the higher header count.
/// Lines that disagree, such as a short row or a footer, never disqualify
/// a candidate.
pub fn detect_delimiter(content: &str) -> Result<u8> {
    let mut lines = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES);

    let header = lines.next().ok_or(DashboardError::EmptyFile)?;
    let sample: Vec<&str> = lines.collect();

    let mut best: Option<(u8, usize, usize)> = None;
    for delimiter in DELIMITERS {
        let expected = count_unquoted(header, delimiter);
        if expected == 0 {
            continue;
        }
        let agreeing = sample
            .iter()
            .filter(|line| count_unquoted(line, delimiter) == expected)
            .count();
        if best.map_or(true, |(_, a, n)| (agreeing, expected) > (a, n)) {
            best = Some((delimiter, agreeing, expected));
        }
    }

    best.map(|(d, _, _)| d).ok_or(DashboardError::DelimiterUndetected)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Trim header names, strip a BOM, rename the first column to
/// [`TIMESTAMP_COLUMN`], and make duplicate names unique with `.1`, `.2`, …
fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();

    for (idx, name) in raw.enumerate() {
        let name = name.trim_start_matches('\u{feff}').trim();
        let base = if idx == 0 {
            TIMESTAMP_COLUMN.to_string()
        } else if name.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while columns.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        columns.push(candidate);
    }

    columns
}

fn concat_tables(tables: Vec<RawTable>) -> RawTable {
    let mut columns: Vec<String> = vec![TIMESTAMP_COLUMN.to_string()];
    let mut index: HashMap<String, usize> = HashMap::from([(TIMESTAMP_COLUMN.to_string(), 0)]);

    // First pass: unified column order and each table's column mapping.
    let mappings: Vec<Vec<usize>> = tables
        .iter()
        .map(|table| {
            table
                .columns
                .iter()
                .map(|name| {
                    *index.entry(name.clone()).or_insert_with(|| {
                        columns.push(name.clone());
                        columns.len() - 1
                    })
                })
                .collect()
        })
        .collect();

    // Second pass: place each cell under its unified column.
    let width = columns.len();
    let mut rows = Vec::with_capacity(tables.iter().map(|t| t.rows.len()).sum());
    for (table, mapping) in tables.into_iter().zip(mappings) {
        for row in table.rows {
            let mut unified = vec![None; width];
            for (cell, &target) in row.into_iter().zip(mapping.iter()) {
                unified[target] = cell;
            }
            rows.push(unified);
        }
    }

    RawTable { columns, rows }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
