//! # tisfeat - translation-initiation features from ribosome profiling
//!
//! Builds a per-transcript feature table for translation-initiation studies
//! from an annotation table (ORF coordinates, read profiles, expression) and
//! the matching transcript sequences.
//!
//! ## Overview
//!
//! The work happens in two passes over the same inputs:
//!
//! 1. **Training** selects well-behaved transcripts, counts the nucleotides
//!    around their start codons and turns the counts into log-odds scoring
//!    matrices, one weighted by translational efficiency and one unweighted.
//! 2. **Extraction** scores the start context of every ORF with both
//!    matrices, aggregates ribosome footprints, measures GC content and asks
//!    an external folding tool for the ensemble free energy around each start.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::HashSet;
//! use std::fs::File;
//! use tisfeat_core::annotation::read_annotation_file;
//! use tisfeat_core::config::{FeatureConfig, OutputFormat};
//! use tisfeat_core::engine::UntrainedPipeline;
//! use tisfeat_core::output::FeatureTableWriter;
//! use tisfeat_core::sequence::IndexedFastaStore;
//!
//! let records = read_annotation_file("annotation.tsv")?;
//! let mut store = IndexedFastaStore::open("transcripts.fa")?;
//!
//! let (trained, summary) = UntrainedPipeline::new().train(&records, &mut store)?;
//! println!("{summary}");
//!
//! let mut table = FeatureTableWriter::new(File::create("features.tsv")?, OutputFormat::Tsv, false)?;
//! trained.extract(&records, &mut store, None, &mut table, &HashSet::new())?;
//! # Ok::<(), tisfeat_core::types::TisFeatError>(())
//! ```
//!
//! ## Architecture
//!
//! [`engine::Pipeline`] uses a type-state parameter so that extraction is
//! only available once a motif model exists, either from a training pass or
//! loaded from disk with [`engine::TrainedPipeline::load`].
//!
//! Sequences are fetched serially through a [`sequence::SequenceStore`],
//! per-transcript work runs on the Rayon pool and results are folded back
//! in input order, so outputs do not depend on the thread count.
//!
//! ## Module Organization
//!
//! - [`annotation`]: annotation table reader
//! - [`config`]: thresholds and window shapes of both passes
//! - [`context`]: motif and structure window extraction
//! - [`engine`]: two-pass pipeline
//! - [`features`]: per-ORF and per-transcript feature computation
//! - [`output`]: matrix tables and the feature table
//! - [`scoring`]: log-odds window scoring
//! - [`sequence`]: sequence stores and nucleotide helpers
//! - [`structure`]: RNA folding backends
//! - [`training`]: training selection, counting and matrix construction
//! - [`types`]: intervals, records and errors
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, TisFeatError>`](types::TisFeatError).
//! Errors raised while processing one transcript carry its identifier.

pub mod annotation;
pub mod config;
pub mod constants;
pub mod context;
pub mod engine;
pub mod features;
pub mod output;
pub mod results;
pub mod scoring;
pub mod sequence;
pub mod structure;
pub mod training;
pub mod types;

pub use config::{FeatureConfig, OutputFormat};
pub use engine::{Pipeline, TrainedPipeline, UntrainedPipeline};
pub use types::TisFeatError;
