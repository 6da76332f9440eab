//! In-memory ingestion of dense and sparse matrix text.
//!
//! Everything here operates on already-loaded strings; fetching, file
//! handles, and decompression stay with the caller. Sparse listings tolerate
//! comma, semicolon, tab, and whitespace delimiters, an optional header row,
//! and duplicate coordinates (merged by summing). Triangular input mirrors
//! each off-diagonal record onto its transposed coordinate.

use rustc_hash::FxHashMap;

use crate::error::VoroserpError;
use crate::types::{Channel, SparseRecord};

/// Coordinate-merged sparse records plus the detected square dimension
/// (`max coordinate + 1`).
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    pub records: Vec<SparseRecord>,
    pub dim: usize,
}

/// Accumulates sparse records across one or more text sources.
///
/// Supports a combined `row,col,valueA,valueB` listing and per-channel
/// `row,col,value` listings layered on top of each other (channel A first,
/// then channel B onto the same coordinates).
#[derive(Debug)]
pub struct SparseAccumulator {
    triangular: bool,
    index: FxHashMap<(u32, u32), usize>,
    records: Vec<SparseRecord>,
    max_coord: Option<u32>,
}

impl SparseAccumulator {
    pub fn new(triangular: bool) -> Self {
        Self {
            triangular,
            index: FxHashMap::default(),
            records: Vec::new(),
            max_coord: None,
        }
    }

    /// Ingest a combined listing with four value columns:
    /// `row, col, valueA, valueB`.
    pub fn ingest_pairs(&mut self, text: &str) -> Result<(), VoroserpError> {
        self.ingest_lines(text, None)
    }

    /// Ingest a single-channel listing (`row, col, value`) into the given
    /// channel, accumulating onto any existing coordinates.
    pub fn ingest_channel(&mut self, text: &str, channel: Channel) -> Result<(), VoroserpError> {
        self.ingest_lines(text, Some(channel))
    }

    /// Finish accumulation, yielding records in first-seen coordinate order.
    pub fn finish(self) -> SparseMatrix {
        SparseMatrix {
            records: self.records,
            dim: self.max_coord.map_or(0, |m| m as usize + 1),
        }
    }

    fn ingest_lines(&mut self, text: &str, channel: Option<Channel>) -> Result<(), VoroserpError> {
        let want_fields = if channel.is_some() { 3 } else { 4 };
        let mut parsed_rows = 0usize;
        let mut first_bad: Option<(usize, String)> = None;
        let mut saw_content = false;

        for (line_no, line) in text.lines().enumerate() {
            let fields: Vec<&str> = line
                .split(|c: char| c == ',' || c == ';' || c == '\t' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .collect();
            if fields.is_empty() {
                continue;
            }
            saw_content = true;

            if parsed_rows == 0 && is_header(&fields) {
                continue;
            }

            if fields.len() < want_fields {
                if first_bad.is_none() {
                    first_bad = Some((
                        line_no + 1,
                        format!("expected {} fields, found {}", want_fields, fields.len()),
                    ));
                }
                continue;
            }

            // Coordinates define identity; rows without numeric coordinates
            // are skipped rather than repaired.
            let (Ok(row), Ok(col)) = (fields[0].parse::<u32>(), fields[1].parse::<u32>()) else {
                if first_bad.is_none() {
                    first_bad = Some((line_no + 1, "non-numeric coordinates".to_string()));
                }
                continue;
            };

            match channel {
                None => {
                    let (Ok(value_a), Ok(value_b)) =
                        (fields[2].parse::<f64>(), fields[3].parse::<f64>())
                    else {
                        continue;
                    };
                    self.add(row, col, value_a, value_b);
                }
                Some(Channel::A) => {
                    let Ok(value) = fields[2].parse::<f64>() else {
                        continue;
                    };
                    self.add(row, col, value, 0.0);
                }
                Some(Channel::B) => {
                    let Ok(value) = fields[2].parse::<f64>() else {
                        continue;
                    };
                    self.add(row, col, 0.0, value);
                }
            }
            parsed_rows += 1;
        }

        if parsed_rows == 0 {
            return match first_bad {
                Some((line, message)) => Err(VoroserpError::MalformedInput { line, message }),
                None if saw_content => Err(VoroserpError::EmptyInput(
                    "no data rows after header".to_string(),
                )),
                None => Err(VoroserpError::EmptyInput("no data rows".to_string())),
            };
        }
        Ok(())
    }

    fn add(&mut self, row: u32, col: u32, value_a: f64, value_b: f64) {
        self.accumulate(row, col, value_a, value_b);
        if self.triangular && row != col {
            self.accumulate(col, row, value_a, value_b);
        }
    }

    fn accumulate(&mut self, row: u32, col: u32, value_a: f64, value_b: f64) {
        self.max_coord = Some(self.max_coord.map_or(row.max(col), |m| m.max(row).max(col)));
        match self.index.get(&(row, col)) {
            Some(&i) => {
                self.records[i].value_a += value_a;
                self.records[i].value_b += value_b;
            }
            None => {
                self.index.insert((row, col), self.records.len());
                self.records
                    .push(SparseRecord::new(row, col, value_a, value_b));
            }
        }
    }
}

fn is_header(fields: &[&str]) -> bool {
    let lowered: Vec<String> = fields.iter().map(|f| f.to_ascii_lowercase()).collect();
    lowered.iter().any(|f| f.starts_with("row")) && lowered.iter().any(|f| f.starts_with("col"))
}

/// Parse a combined `row,col,valueA,valueB` listing.
pub fn parse_sparse_pairs(text: &str, triangular: bool) -> Result<SparseMatrix, VoroserpError> {
    let mut acc = SparseAccumulator::new(triangular);
    acc.ingest_pairs(text)?;
    Ok(acc.finish())
}

/// Parse per-channel `row,col,value` listings: channel A, then optionally
/// channel B layered onto the same coordinates.
pub fn parse_sparse_channels(
    text_a: &str,
    text_b: Option<&str>,
    triangular: bool,
) -> Result<SparseMatrix, VoroserpError> {
    let mut acc = SparseAccumulator::new(triangular);
    acc.ingest_channel(text_a, Channel::A)?;
    if let Some(text_b) = text_b {
        acc.ingest_channel(text_b, Channel::B)?;
    }
    Ok(acc.finish())
}

/// Parse a dense numeric matrix.
///
/// Ragged rows are padded; the result is square (`max(rows, cols)`).
/// Unparseable cells become 0. With `triangular`, each zero cell is filled
/// from its nonzero transpose, whichever side carries the value.
pub fn parse_dense(text: &str, triangular: bool) -> Result<Vec<Vec<f64>>, VoroserpError> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for line in text.lines() {
        let cells: Vec<f64> = line
            .split(|c: char| c == ',' || c == ';' || c == '\t' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .map(|f| f.parse::<f64>().unwrap_or(0.0))
            .collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    if rows.is_empty() {
        return Err(VoroserpError::EmptyInput("no dense rows".to_string()));
    }

    let n = rows
        .iter()
        .map(|r| r.len())
        .max()
        .unwrap_or(0)
        .max(rows.len());
    let mut matrix = vec![vec![0.0; n]; n];
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            matrix[i][j] = v;
        }
    }

    if triangular {
        for i in 0..n {
            for j in (i + 1)..n {
                if matrix[i][j] != 0.0 && matrix[j][i] == 0.0 {
                    matrix[j][i] = matrix[i][j];
                } else if matrix[j][i] != 0.0 && matrix[i][j] == 0.0 {
                    matrix[i][j] = matrix[j][i];
                }
            }
        }
    }
    Ok(matrix)
}

/// Convert dense matrices (channel A, optional channel B) into sparse
/// records, keeping cells where either channel is positive.
pub fn dense_to_records(dense_a: &[Vec<f64>], dense_b: Option<&[Vec<f64>]>) -> SparseMatrix {
    let n = dense_a.len().max(dense_b.map_or(0, |b| b.len()));
    let cell = |m: &[Vec<f64>], r: usize, c: usize| -> f64 {
        m.get(r).and_then(|row| row.get(c)).copied().unwrap_or(0.0)
    };

    let mut records = Vec::new();
    for r in 0..n {
        for c in 0..n {
            let value_a = cell(dense_a, r, c);
            let value_b = dense_b.map_or(0.0, |b| cell(b, r, c));
            if value_a > 0.0 || value_b > 0.0 {
                records.push(SparseRecord::new(r as u32, c as u32, value_a, value_b));
            }
        }
    }
    SparseMatrix { records, dim: n }
}
