//! Persisted artifacts.
//!
//! ## Matrix tables
//!
//! Count and scoring matrices are written as nucleotide-by-position tables
//! (see [`matrix`]). Scoring matrices can be read back losslessly.
//!
//! ## Feature table
//!
//! - **TSV**: one row per transcript under [`FEATURE_COLUMNS`], per-ORF values
//!   joined with commas inside a cell and `NA` for windows that could not be
//!   extracted
//! - **JSONL**: one object per transcript with typed nested ORF records
//!
//! ```rust,no_run
//! use tisfeat_core::config::OutputFormat;
//! use tisfeat_core::output::FeatureTableWriter;
//! use std::fs::File;
//!
//! let file = File::create("features.tsv")?;
//! let mut table = FeatureTableWriter::new(file, OutputFormat::Tsv, false)?;
//! table.flush()?;
//! # Ok::<(), tisfeat_core::types::TisFeatError>(())
//! ```
//!
//! [`FEATURE_COLUMNS`]: crate::constants::FEATURE_COLUMNS

pub mod matrix;
pub mod table;

pub use matrix::{
    read_scoring_matrix, read_scoring_matrix_file, write_count_matrix, write_scoring_matrix,
};
pub use table::{
    FeatureTableWriter, needs_header, resume_feature_table, tsv_row, write_feature_table,
};
