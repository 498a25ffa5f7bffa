//! Input annotation table.
//!
//! Tab-separated with a header row. Columns are located by name, so extra
//! columns and any column order are accepted. List cells (`RPF_csvProfile`,
//! `CDS`, `ORF_starts`, `ORF_ends`) are comma separated and may be wrapped in
//! brackets or parentheses; a bare integer is a one-element list. ORF
//! coordinates are always stored as lists after parsing.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use log::info;

use crate::constants::{
    COL_CDS, COL_EXPRESSION, COL_GENE, COL_GENE_NAME, COL_ORF_ENDS, COL_ORF_STARTS, COL_PROFILE,
    COL_TRANSCRIPT, LIST_SEPARATOR,
};
use crate::types::{Interval, TisFeatError, TranscriptRecord};

struct ColumnIndex {
    transcript: usize,
    gene: usize,
    gene_name: usize,
    expression: usize,
    profile: usize,
    cds: usize,
    orf_starts: usize,
    orf_ends: usize,
}

impl ColumnIndex {
    fn locate(headers: &StringRecord) -> Result<Self, TisFeatError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or_else(|| TisFeatError::ParseError {
                    line: 1,
                    message: format!("missing column '{name}'"),
                })
        };
        Ok(Self {
            transcript: find(COL_TRANSCRIPT)?,
            gene: find(COL_GENE)?,
            gene_name: find(COL_GENE_NAME)?,
            expression: find(COL_EXPRESSION)?,
            profile: find(COL_PROFILE)?,
            cds: find(COL_CDS)?,
            orf_starts: find(COL_ORF_STARTS)?,
            orf_ends: find(COL_ORF_ENDS)?,
        })
    }
}

/// Parse a list cell such as `1,2,3`, `[1, 2, 3]`, `(4,)` or `7`.
///
/// An empty cell (or empty brackets) is an empty list.
pub fn parse_list<T: FromStr>(cell: &str) -> Result<Vec<T>, String> {
    let trimmed = cell.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .or_else(|| {
            trimmed
                .strip_prefix('(')
                .and_then(|rest| rest.strip_suffix(')'))
        })
        .unwrap_or(trimmed);

    inner
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| format!("'{value}' is not a valid value"))
        })
        .collect()
}

fn parse_record(
    row: &StringRecord,
    columns: &ColumnIndex,
    line: usize,
) -> Result<TranscriptRecord, TisFeatError> {
    let field = |index: usize| row.get(index).unwrap_or_default().trim();
    let transcript_id = field(columns.transcript).to_string();
    if transcript_id.is_empty() {
        return Err(TisFeatError::ParseError {
            line,
            message: "empty transcript identifier".to_string(),
        });
    }
    let parse_error = |column: &str, message: String| TisFeatError::ParseError {
        line,
        message: format!("{transcript_id}: column {column}: {message}"),
    };
    let invalid = |message: String| TisFeatError::InvalidRecord {
        transcript: transcript_id.clone(),
        message,
    };

    let expression = field(columns.expression)
        .parse::<f64>()
        .map_err(|_| {
            parse_error(
                COL_EXPRESSION,
                format!("'{}' is not a number", field(columns.expression)),
            )
        })?;
    let reads: Vec<u32> =
        parse_list(field(columns.profile)).map_err(|e| parse_error(COL_PROFILE, e))?;

    let cds = match parse_list::<usize>(field(columns.cds))
        .map_err(|e| parse_error(COL_CDS, e))?
        .as_slice()
    {
        [start, end] => Interval::new(*start, *end),
        other => {
            return Err(invalid(format!(
                "CDS must be a start,end pair, found {} values",
                other.len()
            )));
        }
    };

    let starts: Vec<usize> =
        parse_list(field(columns.orf_starts)).map_err(|e| parse_error(COL_ORF_STARTS, e))?;
    let ends: Vec<usize> =
        parse_list(field(columns.orf_ends)).map_err(|e| parse_error(COL_ORF_ENDS, e))?;
    if starts.len() != ends.len() {
        return Err(invalid(format!(
            "{} ORF starts but {} ORF ends",
            starts.len(),
            ends.len()
        )));
    }
    let orfs = starts
        .into_iter()
        .zip(ends)
        .map(|(start, end)| Interval::new(start, end))
        .collect();

    let record = TranscriptRecord {
        gene_id: field(columns.gene).to_string(),
        gene_name: field(columns.gene_name).to_string(),
        expression,
        reads,
        cds,
        orfs,
        transcript_id,
    };
    record.validate()?;
    Ok(record)
}

/// Read and validate every record of an annotation table, in file order.
///
/// # Errors
///
/// Fails on the first malformed row: [`TisFeatError::ParseError`] for
/// unparsable cells or missing columns, [`TisFeatError::InvalidRecord`] for
/// coordinate violations and [`TisFeatError::DuplicateTranscript`] for a
/// repeated identifier.
///
/// # Examples
///
/// ```rust
/// use tisfeat_core::annotation::read_annotation;
///
/// let table = "Transcript\tGene\tGene_Name\tGene_Expression_FPKM\tRPF_csvProfile\tCDS\tORF_starts\tORF_ends\n\
///              tx1\tg1\tA1\t2.5\t0,0,1,1,1,1,0,0\t2,8\t2\t8\n";
/// let records = read_annotation(table.as_bytes())?;
/// assert_eq!(records[0].orfs.len(), 1);
/// # Ok::<(), tisfeat_core::types::TisFeatError>(())
/// ```
pub fn read_annotation<R: Read>(reader: R) -> Result<Vec<TranscriptRecord>, TisFeatError> {
    let mut table = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let columns = ColumnIndex::locate(table.headers()?)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for result in table.records() {
        let row = result?;
        let line = row.position().map_or(0, |position| position.line() as usize);
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let record = parse_record(&row, &columns, line)?;
        if !seen.insert(record.transcript_id.clone()) {
            return Err(TisFeatError::DuplicateTranscript(record.transcript_id));
        }
        records.push(record);
    }
    Ok(records)
}

/// Read an annotation table from a file path.
///
/// # Errors
///
/// Returns [`TisFeatError::IoError`] when the file cannot be opened, plus any
/// error of [`read_annotation`].
pub fn read_annotation_file<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<TranscriptRecord>, TisFeatError> {
    let path = path.as_ref();
    let records = read_annotation(File::open(path)?)?;
    info!("read {} transcripts from {}", records.len(), path.display());
    Ok(records)
}
