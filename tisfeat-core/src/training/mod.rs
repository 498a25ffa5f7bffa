//! Motif model construction.
//!
//! Training runs in two steps. Every transcript is first reduced to at most
//! one [`TrainingContribution`] (selection, weight and motif window). The
//! contributions are then folded in input order into a [`MotifCounts`]
//! accumulator, from which [`TrainedMotifs::from_counts`] derives the
//! background distribution and the two CDS log-odds matrices.

pub mod common;
pub mod counts;
pub mod selection;

use std::fs;
use std::path::Path;

use log::debug;

use crate::config::FeatureConfig;
use crate::constants::{
    CDS_UNWEIGHTED_COUNTS_FILE, CDS_WEIGHTED_COUNTS_FILE, NUM_BASES, UNWEIGHTED_SCORE_FILE,
    UORF_UNWEIGHTED_COUNTS_FILE, UORF_WEIGHTED_COUNTS_FILE, WEIGHTED_SCORE_FILE,
};
use crate::context::motif_context;
use crate::output::matrix::{read_scoring_matrix_file, write_count_matrix_file, write_scoring_matrix_file};
use crate::scoring::ScoringMatrix;
use crate::types::{TisFeatError, TranscriptRecord};

pub use common::{background_distribution, log_odds_matrix};
pub use counts::{CountMatrix, MotifCounts};
pub use selection::{TrainingExample, TrainingSet, select_training_example};

/// Outcome of reducing one transcript for training
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingContribution {
    /// The transcript fails the selection gates
    Excluded,
    /// Selected, but the motif window does not fit inside the sequence
    InvalidWindow(TrainingSet),
    /// Selected with a complete motif window
    Window {
        set: TrainingSet,
        window: Vec<u8>,
        weight: f64,
    },
}

/// Reduce a transcript to its training contribution.
///
/// `sequence` must be the full transcript sequence.
#[must_use]
pub fn training_contribution(
    record: &TranscriptRecord,
    sequence: &[u8],
    config: &FeatureConfig,
) -> TrainingContribution {
    let Some(example) = select_training_example(record, config) else {
        return TrainingContribution::Excluded;
    };
    match motif_context(sequence, example.start, &config.motif_flanks) {
        Some(window) => TrainingContribution::Window {
            set: example.set,
            window,
            weight: example.weight,
        },
        None => {
            debug!(
                "{}: motif window at {} out of bounds, not used for training",
                record.transcript_id, example.start
            );
            TrainingContribution::InvalidWindow(example.set)
        }
    }
}

/// Add one contribution to the accumulator
pub fn accumulate(
    counts: &mut MotifCounts,
    contribution: &TrainingContribution,
) -> Result<(), TisFeatError> {
    match contribution {
        TrainingContribution::Window {
            set: TrainingSet::Cds,
            window,
            weight,
        } => counts.add_cds(window, *weight),
        TrainingContribution::Window {
            set: TrainingSet::Uorf,
            window,
            weight,
        } => counts.add_uorf(window, *weight),
        TrainingContribution::Excluded | TrainingContribution::InvalidWindow(_) => Ok(()),
    }
}

/// The pair of CDS-context scoring matrices consumed by feature extraction.
///
/// # Examples
///
/// ```rust,no_run
/// use tisfeat_core::training::MotifModel;
///
/// let model = MotifModel::load("model/")?;
/// println!("motif window width {}", model.width());
/// # Ok::<(), tisfeat_core::types::TisFeatError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MotifModel {
    /// Scores derived from TE-weighted counts (WRENT)
    pub weighted: ScoringMatrix,
    /// Scores derived from raw counts (URENT)
    pub unweighted: ScoringMatrix,
}

impl MotifModel {
    #[must_use]
    pub fn width(&self) -> usize {
        self.unweighted.width()
    }

    /// Reload the scoring matrices written by [`MotifModel::save`].
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::IoError`] for missing files and
    /// [`TisFeatError::InvalidMatrix`] for malformed tables or matrices of
    /// different widths.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, TisFeatError> {
        let dir = dir.as_ref();
        let weighted = read_scoring_matrix_file(dir.join(WEIGHTED_SCORE_FILE))?;
        let unweighted = read_scoring_matrix_file(dir.join(UNWEIGHTED_SCORE_FILE))?;
        if weighted.width() != unweighted.width() {
            return Err(TisFeatError::InvalidMatrix(format!(
                "weighted matrix has width {}, unweighted matrix has width {}",
                weighted.width(),
                unweighted.width()
            )));
        }
        Ok(Self {
            weighted,
            unweighted,
        })
    }

    /// Write both scoring matrices into `dir`, creating it if needed
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<(), TisFeatError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        write_scoring_matrix_file(dir.join(WEIGHTED_SCORE_FILE), &self.weighted)?;
        write_scoring_matrix_file(dir.join(UNWEIGHTED_SCORE_FILE), &self.unweighted)?;
        Ok(())
    }
}

/// Everything produced by one training pass
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedMotifs {
    pub counts: MotifCounts,
    /// Background shared by both scoring matrices
    pub background: [f64; NUM_BASES],
    pub model: MotifModel,
}

impl TrainedMotifs {
    /// Derive the scoring matrices from accumulated counts.
    ///
    /// The background comes from the unweighted CDS counts and is used for
    /// the weighted and the unweighted matrix alike. The uORF counts are kept
    /// as artifacts only.
    #[must_use]
    pub fn from_counts(counts: MotifCounts, degenerate_score: f64) -> Self {
        let unweighted_columns = counts.cds_unweighted.base_columns();
        let weighted_columns = counts.cds_weighted.base_columns();
        let background = background_distribution(&unweighted_columns);
        let model = MotifModel {
            weighted: log_odds_matrix(&weighted_columns, &background, degenerate_score),
            unweighted: log_odds_matrix(&unweighted_columns, &background, degenerate_score),
        };
        Self {
            counts,
            background,
            model,
        }
    }

    /// Write the four count tables and both scoring matrices into `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<(), TisFeatError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        write_count_matrix_file(dir.join(CDS_WEIGHTED_COUNTS_FILE), &self.counts.cds_weighted)?;
        write_count_matrix_file(
            dir.join(CDS_UNWEIGHTED_COUNTS_FILE),
            &self.counts.cds_unweighted,
        )?;
        write_count_matrix_file(dir.join(UORF_WEIGHTED_COUNTS_FILE), &self.counts.uorf_weighted)?;
        write_count_matrix_file(
            dir.join(UORF_UNWEIGHTED_COUNTS_FILE),
            &self.counts.uorf_unweighted,
        )?;
        self.model.save(dir)
    }
}
