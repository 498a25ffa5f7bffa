use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use log::warn;

use crate::config::OutputFormat;
use crate::constants::{FEATURE_COLUMNS, LIST_SEPARATOR, MISSING_VALUE};
use crate::features::{OrfFeatures, TranscriptFeatures};
use crate::types::TisFeatError;

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING_VALUE.to_string(), |v| v.to_string())
}

fn join<T, F, S>(orfs: &[T], value: F) -> String
where
    F: Fn(&T) -> S,
    S: ToString,
{
    orfs.iter()
        .map(|orf| value(orf).to_string())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

fn orf_context(orf: &OrfFeatures) -> String {
    orf.context
        .clone()
        .unwrap_or_else(|| MISSING_VALUE.to_string())
}

/// Cells of one feature table row, in [`FEATURE_COLUMNS`] order
#[must_use]
pub fn tsv_row(features: &TranscriptFeatures) -> Vec<String> {
    let uorfs = &features.uorfs;
    let cds = &features.cds;
    let orfs = &features.orfs;
    vec![
        features.transcript_id.clone(),
        features.gene_id.clone(),
        features.gene_name.clone(),
        features.expression.to_string(),
        features.utr5_length.to_string(),
        features.utr3_length.to_string(),
        features.cds_length.to_string(),
        features.utr5_reads.to_string(),
        features.utr5_reads_trimmed.to_string(),
        features.utr5_gc.to_string(),
        features.cds_gc.to_string(),
        features.cds_reads.to_string(),
        optional(features.cds_te),
        features.uorf_count.to_string(),
        join(uorfs, |orf| orf.reads),
        features.uorf_union_reads.to_string(),
        features.uorf_union_length.to_string(),
        join(uorfs, |orf| orf.start),
        join(uorfs, |orf| orf.end_to_cds),
        join(uorfs, |orf| orf.length),
        join(uorfs, orf_context),
        join(uorfs, |orf| optional(orf.wrent)),
        join(uorfs, |orf| optional(orf.urent)),
        join(uorfs, |orf| optional(orf.efe_upstream)),
        join(uorfs, |orf| optional(orf.efe_downstream)),
        cds.start.to_string(),
        orf_context(cds),
        optional(cds.wrent),
        optional(cds.urent),
        optional(cds.efe_upstream),
        optional(cds.efe_downstream),
        join(orfs, |orf| orf.start),
        join(orfs, |orf| orf.length),
        join(orfs, orf_context),
        join(orfs, |orf| optional(orf.wrent)),
        join(orfs, |orf| optional(orf.urent)),
        join(orfs, |orf| optional(orf.efe_upstream)),
        join(orfs, |orf| optional(orf.efe_downstream)),
        features.orf_types.clone(),
    ]
}

/// Streaming writer of feature rows in either output format.
///
/// Rows are written in call order; nothing is reordered or buffered beyond
/// the underlying writer.
pub enum FeatureTableWriter<W: Write> {
    Tsv(csv::Writer<W>),
    Jsonl(W),
}

impl<W: Write> FeatureTableWriter<W> {
    /// Create a writer, emitting the TSV header unless `append` is set
    pub fn new(writer: W, format: OutputFormat, append: bool) -> Result<Self, TisFeatError> {
        match format {
            OutputFormat::Tsv => {
                let mut table = WriterBuilder::new()
                    .delimiter(b'\t')
                    .has_headers(false)
                    .from_writer(writer);
                if !append {
                    table.write_record(FEATURE_COLUMNS)?;
                }
                Ok(Self::Tsv(table))
            }
            OutputFormat::Jsonl => Ok(Self::Jsonl(writer)),
        }
    }

    pub fn write(&mut self, features: &TranscriptFeatures) -> Result<(), TisFeatError> {
        match self {
            Self::Tsv(table) => table.write_record(tsv_row(features))?,
            Self::Jsonl(writer) => {
                serde_json::to_writer(&mut *writer, features)?;
                writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), TisFeatError> {
        match self {
            Self::Tsv(table) => table.flush()?,
            Self::Jsonl(writer) => writer.flush()?,
        }
        Ok(())
    }
}

/// Write a complete feature table.
///
/// # Examples
///
/// ```rust,no_run
/// use tisfeat_core::config::OutputFormat;
/// use tisfeat_core::features::TranscriptFeatures;
/// use tisfeat_core::output::write_feature_table;
///
/// let rows: Vec<TranscriptFeatures> = Vec::new();
/// let mut out = std::io::stdout();
/// write_feature_table(&mut out, &rows, OutputFormat::Tsv)?;
/// # Ok::<(), tisfeat_core::types::TisFeatError>(())
/// ```
pub fn write_feature_table<W: Write>(
    writer: W,
    rows: &[TranscriptFeatures],
    format: OutputFormat,
) -> Result<(), TisFeatError> {
    let mut table = FeatureTableWriter::new(writer, format, false)?;
    for row in rows {
        table.write(row)?;
    }
    table.flush()
}

/// Prepare an existing feature table for appending and return the
/// transcripts it already holds.
///
/// A trailing partial row left by an interrupted run is cut off. A missing
/// or empty file yields an empty set.
///
/// # Errors
///
/// Returns [`TisFeatError::InvalidConfig`] when the file was written with a
/// different layout than `format`.
pub fn resume_feature_table<P: AsRef<Path>>(
    path: P,
    format: OutputFormat,
) -> Result<HashSet<String>, TisFeatError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let mut contents = fs::read(path)?;
    let complete = contents
        .iter()
        .rposition(|&byte| byte == b'\n')
        .map_or(0, |last| last + 1);
    if complete < contents.len() {
        warn!(
            "dropping {} bytes of an incomplete row at the end of {}",
            contents.len() - complete,
            path.display()
        );
        OpenOptions::new()
            .write(true)
            .open(path)?
            .set_len(complete as u64)?;
        contents.truncate(complete);
    }

    let text = String::from_utf8_lossy(&contents);
    let mut lines = text.lines();
    let mut done = HashSet::new();
    match format {
        OutputFormat::Tsv => {
            let Some(header) = lines.next() else {
                return Ok(done);
            };
            if header.split('\t').ne(FEATURE_COLUMNS) {
                return Err(TisFeatError::InvalidConfig(format!(
                    "{} is not a feature table of this version",
                    path.display()
                )));
            }
            for line in lines {
                if let Some(id) = line.split('\t').next().filter(|id| !id.is_empty()) {
                    done.insert(id.to_string());
                }
            }
        }
        OutputFormat::Jsonl => {
            for line in lines.filter(|line| !line.trim().is_empty()) {
                let row: serde_json::Value = serde_json::from_str(line)?;
                let id = row
                    .get("transcript_id")
                    .and_then(serde_json::Value::as_str)
                    .ok_or_else(|| {
                        TisFeatError::InvalidConfig(format!(
                            "{} holds a row without transcript_id",
                            path.display()
                        ))
                    })?;
                done.insert(id.to_string());
            }
        }
    }
    Ok(done)
}

/// True when the TSV header has to be written, i.e. the file is new or empty
#[must_use]
pub fn needs_header(path: &Path) -> bool {
    fs::metadata(path).map_or(true, |meta| meta.len() == 0)
}
