use crate::constants::{AMBIGUOUS_ROW, NUM_BASES, NUM_COUNT_ROWS};
use crate::sequence::count_row;
use crate::types::TisFeatError;

/// Accumulated nucleotide observations per window position.
///
/// Tracks the four real bases plus one row for every ambiguous symbol. The
/// ambiguous row is dropped by [`base_columns`](Self::base_columns) before
/// any frequency is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMatrix {
    columns: Vec<[f64; NUM_COUNT_ROWS]>,
}

impl CountMatrix {
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            columns: vec![[0.0; NUM_COUNT_ROWS]; width],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Add `weight` to the cell of every (position, nucleotide) pair of the
    /// window.
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::WindowWidthMismatch`] if the window length
    /// differs from the matrix width.
    pub fn add_window(&mut self, window: &[u8], weight: f64) -> Result<(), TisFeatError> {
        if window.len() != self.width() {
            return Err(TisFeatError::WindowWidthMismatch {
                expected: self.width(),
                actual: window.len(),
            });
        }
        for (column, &base) in self.columns.iter_mut().zip(window) {
            column[count_row(base)] += weight;
        }
        Ok(())
    }

    /// Count of `row` at `position`; row [`AMBIGUOUS_ROW`] holds N
    #[must_use]
    pub fn get(&self, row: usize, position: usize) -> f64 {
        self.columns[position][row]
    }

    /// Observations of ambiguous symbols summed over every position
    #[must_use]
    pub fn ambiguous_total(&self) -> f64 {
        self.columns.iter().map(|column| column[AMBIGUOUS_ROW]).sum()
    }

    /// Counts of the real bases only, the ambiguous row removed
    #[must_use]
    pub fn base_columns(&self) -> Vec<[f64; NUM_BASES]> {
        self.columns
            .iter()
            .map(|column| {
                let mut bases = [0.0; NUM_BASES];
                bases.copy_from_slice(&column[..NUM_BASES]);
                bases
            })
            .collect()
    }

    /// Add another matrix of the same width cell by cell
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::WindowWidthMismatch`] for matrices of
    /// different widths.
    pub fn merge(&mut self, other: &Self) -> Result<(), TisFeatError> {
        if other.width() != self.width() {
            return Err(TisFeatError::WindowWidthMismatch {
                expected: self.width(),
                actual: other.width(),
            });
        }
        for (mine, theirs) in self.columns.iter_mut().zip(&other.columns) {
            for (cell, value) in mine.iter_mut().zip(theirs) {
                *cell += value;
            }
        }
        Ok(())
    }
}

/// The four accumulators of one training pass
#[derive(Debug, Clone, PartialEq)]
pub struct MotifCounts {
    pub cds_weighted: CountMatrix,
    pub cds_unweighted: CountMatrix,
    pub uorf_weighted: CountMatrix,
    pub uorf_unweighted: CountMatrix,
    /// Transcripts accumulated into the CDS matrices
    pub cds_examples: usize,
    /// Transcripts accumulated into the uORF matrices
    pub uorf_examples: usize,
}

impl MotifCounts {
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            cds_weighted: CountMatrix::new(width),
            cds_unweighted: CountMatrix::new(width),
            uorf_weighted: CountMatrix::new(width),
            uorf_unweighted: CountMatrix::new(width),
            cds_examples: 0,
            uorf_examples: 0,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.cds_unweighted.width()
    }

    /// Record one CDS-context window with its weight
    pub fn add_cds(&mut self, window: &[u8], weight: f64) -> Result<(), TisFeatError> {
        self.cds_weighted.add_window(window, weight)?;
        self.cds_unweighted.add_window(window, 1.0)?;
        self.cds_examples += 1;
        Ok(())
    }

    /// Record one uORF-context window with its weight
    pub fn add_uorf(&mut self, window: &[u8], weight: f64) -> Result<(), TisFeatError> {
        self.uorf_weighted.add_window(window, weight)?;
        self.uorf_unweighted.add_window(window, 1.0)?;
        self.uorf_examples += 1;
        Ok(())
    }

    /// Fold a partial accumulator into this one
    pub fn merge(&mut self, other: &Self) -> Result<(), TisFeatError> {
        self.cds_weighted.merge(&other.cds_weighted)?;
        self.cds_unweighted.merge(&other.cds_unweighted)?;
        self.uorf_weighted.merge(&other.uorf_weighted)?;
        self.uorf_unweighted.merge(&other.uorf_unweighted)?;
        self.cds_examples += other.cds_examples;
        self.uorf_examples += other.uorf_examples;
        Ok(())
    }
}
