use crate::constants::{NUCLEOTIDES, NUM_BASES};
use crate::sequence::nucleotide_index;
use crate::types::TisFeatError;

/// Position-specific log-odds scores over A, T, C, G.
///
/// Immutable once built; one column of four scores per window position.
///
/// # Examples
///
/// ```rust
/// use tisfeat_core::scoring::ScoringMatrix;
///
/// let matrix = ScoringMatrix::from_columns(vec![
///     [1.0, 0.0, -1.0, 0.5],
///     [0.0, 2.0, 0.0, 0.0],
/// ]);
/// assert_eq!(matrix.score(b"AT")?, 3.0);
/// assert!(matrix.score(b"ATG").is_err());
/// # Ok::<(), tisfeat_core::types::TisFeatError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringMatrix {
    columns: Vec<[f64; NUM_BASES]>,
}

impl ScoringMatrix {
    #[must_use]
    pub fn from_columns(columns: Vec<[f64; NUM_BASES]>) -> Self {
        Self { columns }
    }

    /// Window width the matrix was trained for
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[[f64; NUM_BASES]] {
        &self.columns
    }

    /// Score of `base` at `position`, `None` outside the matrix or for
    /// ambiguous symbols
    #[must_use]
    pub fn get(&self, base: u8, position: usize) -> Option<f64> {
        let row = nucleotide_index(base)?;
        self.columns.get(position).map(|column| column[row])
    }

    /// Scores of one nucleotide across every position, in position order
    pub fn row(&self, row: usize) -> impl Iterator<Item = f64> + '_ {
        self.columns.iter().map(move |column| column[row])
    }

    /// Sum of per-position scores over the window.
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::WindowWidthMismatch`] when the window length
    /// differs from [`width`](Self::width), and
    /// [`TisFeatError::InvalidNucleotide`] for any symbol outside A, C, G, T.
    pub fn score(&self, window: &[u8]) -> Result<f64, TisFeatError> {
        if window.len() != self.width() {
            return Err(TisFeatError::WindowWidthMismatch {
                expected: self.width(),
                actual: window.len(),
            });
        }

        window
            .iter()
            .zip(&self.columns)
            .enumerate()
            .try_fold(0.0, |total, (position, (&base, column))| {
                let row = nucleotide_index(base).ok_or(TisFeatError::InvalidNucleotide {
                    nucleotide: char::from(base),
                    position,
                })?;
                Ok(total + column[row])
            })
    }

    /// Nucleotide symbols in row order, for table writers
    #[must_use]
    pub const fn row_labels() -> [u8; NUM_BASES] {
        NUCLEOTIDES
    }
}
