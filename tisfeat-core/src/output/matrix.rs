//! Nucleotide-by-position matrix tables.
//!
//! Layout: a header `nucleotide 0 1 ... w-1`, then one tab-separated row per
//! base in the order A, T, C, G. Values use the shortest representation that
//! parses back to the same `f64`, so a reload reproduces every score bit for
//! bit (including `inf` and `-inf`).

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::constants::{MATRIX_ROW_HEADER, NUCLEOTIDES, NUM_BASES};
use crate::scoring::ScoringMatrix;
use crate::sequence::nucleotide_index;
use crate::training::CountMatrix;
use crate::types::TisFeatError;

fn write_matrix_table<W: Write>(
    writer: W,
    columns: &[[f64; NUM_BASES]],
) -> Result<(), TisFeatError> {
    let mut table = WriterBuilder::new().delimiter(b'\t').from_writer(writer);

    let mut header = vec![MATRIX_ROW_HEADER.to_string()];
    header.extend((0..columns.len()).map(|position| position.to_string()));
    table.write_record(&header)?;

    for (row, &base) in NUCLEOTIDES.iter().enumerate() {
        let mut record = vec![char::from(base).to_string()];
        record.extend(columns.iter().map(|column| column[row].to_string()));
        table.write_record(&record)?;
    }
    table.flush()?;
    Ok(())
}

/// Write raw accumulated counts; the ambiguous row is not persisted
pub fn write_count_matrix<W: Write>(writer: W, matrix: &CountMatrix) -> Result<(), TisFeatError> {
    write_matrix_table(writer, &matrix.base_columns())
}

/// Write log2-odds scores
pub fn write_scoring_matrix<W: Write>(
    writer: W,
    matrix: &ScoringMatrix,
) -> Result<(), TisFeatError> {
    write_matrix_table(writer, matrix.columns())
}

/// Write a count matrix to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`TisFeatError::IoError`] when the file cannot be created and
/// [`TisFeatError::TableError`] when a row cannot be written.
pub fn write_count_matrix_file<P: AsRef<Path>>(
    path: P,
    matrix: &CountMatrix,
) -> Result<(), TisFeatError> {
    let writer = BufWriter::new(File::create(path)?);
    write_count_matrix(writer, matrix)
}

/// Write a scoring matrix to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`TisFeatError::IoError`] when the file cannot be created and
/// [`TisFeatError::TableError`] when a row cannot be written.
pub fn write_scoring_matrix_file<P: AsRef<Path>>(
    path: P,
    matrix: &ScoringMatrix,
) -> Result<(), TisFeatError> {
    let writer = BufWriter::new(File::create(path)?);
    write_scoring_matrix(writer, matrix)
}

/// Parse a scoring matrix table.
///
/// Rows may come in any order but each of A, T, C, G must appear exactly
/// once, and position headers must run `0..width`.
///
/// # Errors
///
/// Returns [`TisFeatError::InvalidMatrix`] for any deviation from the layout
/// and [`TisFeatError::TableError`] for unreadable input.
pub fn read_scoring_matrix<R: Read>(reader: R) -> Result<ScoringMatrix, TisFeatError> {
    let mut table = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);

    let headers = table.headers()?.clone();
    if headers.get(0) != Some(MATRIX_ROW_HEADER) {
        return Err(TisFeatError::InvalidMatrix(format!(
            "first column must be '{MATRIX_ROW_HEADER}'"
        )));
    }
    let width = headers.len() - 1;
    for (expected, label) in headers.iter().skip(1).enumerate() {
        if label.parse::<usize>().ok() != Some(expected) {
            return Err(TisFeatError::InvalidMatrix(format!(
                "expected position {expected} in header, found '{label}'"
            )));
        }
    }

    let mut columns = vec![[0.0; NUM_BASES]; width];
    let mut seen = [false; NUM_BASES];
    for result in table.records() {
        let record = result?;
        let label = record.get(0).unwrap_or_default();
        let row = match label.as_bytes() {
            [base] => nucleotide_index(*base),
            _ => None,
        }
        .ok_or_else(|| TisFeatError::InvalidMatrix(format!("unknown nucleotide row '{label}'")))?;
        if std::mem::replace(&mut seen[row], true) {
            return Err(TisFeatError::InvalidMatrix(format!(
                "nucleotide row '{label}' appears twice"
            )));
        }
        for (position, field) in record.iter().skip(1).enumerate() {
            columns[position][row] = field.trim().parse::<f64>().map_err(|_| {
                TisFeatError::InvalidMatrix(format!(
                    "row '{label}' position {position}: '{field}' is not a number"
                ))
            })?;
        }
    }

    if seen.iter().any(|&present| !present) {
        return Err(TisFeatError::InvalidMatrix(
            "matrix must have one row for each of A, T, C, G".to_string(),
        ));
    }
    Ok(ScoringMatrix::from_columns(columns))
}

/// Load a scoring matrix written by [`write_scoring_matrix_file`].
///
/// # Errors
///
/// Returns [`TisFeatError::IoError`] when the file cannot be opened, plus any
/// error of [`read_scoring_matrix`].
pub fn read_scoring_matrix_file<P: AsRef<Path>>(path: P) -> Result<ScoringMatrix, TisFeatError> {
    read_scoring_matrix(File::open(path)?)
}
