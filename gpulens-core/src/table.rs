//! Tabular loader for GPU profiler CSV exports.
//!
//! Parses raw upload bytes into a column-oriented [`Table`]. The header row
//! declares the column set; rows that do not fit it are dropped rather than
//! aborting the load.

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of skipped-row reasons retained in a [`LoadReport`].
const MAX_SKIP_SAMPLES: usize = 10;

/// An in-memory, read-only sample table.
///
/// Each column holds one slot per row; `None` marks a missing cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    data: Vec<Vec<Option<f64>>>,
    index: HashMap<String, usize>,
    row_count: usize,
}

impl Table {
    /// Create a table with the given columns and no rows.
    pub fn empty<S: AsRef<str>>(columns: &[S]) -> Self {
        let mut table = Self::default();
        for name in columns {
            table.push_column(name.as_ref());
        }
        table
    }

    /// Build a table from fully populated columns.
    ///
    /// Shorter columns are padded with missing cells up to the longest one.
    pub fn from_columns<S: AsRef<str>>(columns: Vec<(S, Vec<f64>)>) -> Self {
        let row_count = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let mut table = Self::default();
        for (name, values) in columns {
            let idx = table.push_column(name.as_ref());
            let mut cells: Vec<Option<f64>> = values.into_iter().map(Some).collect();
            cells.resize(row_count, None);
            table.data[idx] = cells;
        }
        table.row_count = row_count;
        table
    }

    /// Column names in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Raw cells of a column, including missing ones.
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.index.get(name).map(|&idx| self.data[idx].as_slice())
    }

    /// Present (non-missing) values of a column in row order.
    pub fn values(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name)
            .map(|cells| cells.iter().filter_map(|c| *c).collect())
    }

    /// Register a column, de-duplicating repeated header names as `name.1`, `name.2`, ...
    fn push_column(&mut self, name: &str) -> usize {
        let mut unique = name.to_string();
        let mut n = 1;
        while self.index.contains_key(&unique) {
            unique = format!("{name}.{n}");
            n += 1;
        }
        let idx = self.columns.len();
        self.index.insert(unique.clone(), idx);
        self.columns.push(unique);
        self.data.push(Vec::new());
        idx
    }

    fn push_row(&mut self, row: Vec<Option<f64>>) {
        for (idx, cell) in row.into_iter().enumerate() {
            self.data[idx].push(cell);
        }
        self.row_count += 1;
    }
}

/// A row dropped during loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number in the source document.
    pub line: u64,
    pub reason: String,
}

/// Summary of what the loader kept and dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub columns: Vec<String>,
    pub rows_kept: usize,
    pub rows_skipped: usize,
    /// The first few skipped rows, for diagnosis.
    pub skipped: Vec<SkippedRow>,
}

/// Parse CSV bytes into a [`Table`].
pub fn load(raw: &[u8]) -> Result<Table, LoadError> {
    load_with_report(raw).map(|(table, _)| table)
}

/// Parse CSV bytes into a [`Table`] and report dropped rows.
pub fn load_with_report(raw: &[u8]) -> Result<(Table, LoadReport), LoadError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(LoadError::EmptyInput);
    }
    if let Some(offset) = raw.iter().position(|&b| b == 0) {
        return Err(LoadError::BinaryContent { offset });
    }

    let text = decode_latin1(raw);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(LoadError::MissingHeader);
    }

    let mut table = Table::empty(&headers.iter().collect::<Vec<_>>());
    let mut report = LoadReport {
        columns: table.columns().to_vec(),
        ..LoadReport::default()
    };

    for result in reader.records() {
        let parsed = result
            .map_err(|e| (e.position().map(|p| p.line()).unwrap_or(0), e.to_string()))
            .and_then(|record| {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                parse_record(&record, headers.len()).map_err(|reason| (line, reason))
            });
        match parsed {
            Ok(row) => table.push_row(row),
            Err((line, reason)) => {
                tracing::warn!(line, reason = %reason, "Dropping malformed CSV row");
                report.rows_skipped += 1;
                if report.skipped.len() < MAX_SKIP_SAMPLES {
                    report.skipped.push(SkippedRow { line, reason });
                }
            }
        }
    }

    report.rows_kept = table.row_count();
    tracing::info!(
        columns = table.columns().len(),
        rows = report.rows_kept,
        skipped = report.rows_skipped,
        "Loaded profiler CSV"
    );
    Ok((table, report))
}

/// ISO-8859-1 decoding: every byte maps to the code point of the same value.
fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().copied().map(char::from).collect()
}

fn parse_record(record: &csv::StringRecord, width: usize) -> Result<Vec<Option<f64>>, String> {
    if record.len() != width {
        return Err(format!("expected {} fields, got {}", width, record.len()));
    }
    record
        .iter()
        .enumerate()
        .map(|(idx, cell)| parse_cell(cell).map_err(|e| format!("field {}: {e}: {cell:?}", idx + 1)))
        .collect()
}

/// Empty and NaN cells are missing; infinities and overflowing literals reject the row.
fn parse_cell(cell: &str) -> Result<Option<f64>, &'static str> {
    if cell.is_empty() {
        return Ok(None);
    }
    let value: f64 = cell.parse().map_err(|_| "not a number")?;
    if value.is_nan() {
        return Ok(None);
    }
    if value.is_infinite() {
        return Err("not a finite number");
    }
    Ok(Some(value))
}
