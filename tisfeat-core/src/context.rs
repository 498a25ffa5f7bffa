//! Fixed-width windows around start codons.
//!
//! Both extractors are total: a window that does not fit inside the sequence
//! yields `None` and is never truncated. Callers therefore cannot score or
//! fold a partial window by accident.

use crate::constants::CODON_LENGTH;

/// Number of nucleotides taken on either side of a start position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flanks {
    /// Upstream nucleotides
    pub left: usize,
    /// Downstream nucleotides
    pub right: usize,
}

impl Flanks {
    #[must_use]
    pub const fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }

    /// Length of every window extracted with these flanks
    #[must_use]
    pub const fn width(&self) -> usize {
        self.left + self.right
    }
}

/// Motif window around the start codon at `start`, codon excluded.
///
/// Concatenates `sequence[start - left..start]` and
/// `sequence[start + 3..start + 3 + right]`. The result always has length
/// `flanks.width()`.
///
/// # Examples
///
/// ```rust
/// use tisfeat_core::context::{Flanks, motif_context};
///
/// let seq = b"GGGCCATGAAA";
/// let window = motif_context(seq, 5, &Flanks::new(2, 2)).unwrap();
/// assert_eq!(window, b"CCAA");
/// assert!(motif_context(seq, 1, &Flanks::new(2, 2)).is_none());
/// ```
#[must_use]
pub fn motif_context(sequence: &[u8], start: usize, flanks: &Flanks) -> Option<Vec<u8>> {
    let upstream_start = start.checked_sub(flanks.left)?;
    let downstream_start = start.checked_add(CODON_LENGTH)?;
    let downstream_end = downstream_start.checked_add(flanks.right)?;
    if downstream_end > sequence.len() {
        return None;
    }

    let mut window = Vec::with_capacity(flanks.width());
    window.extend_from_slice(&sequence[upstream_start..start]);
    window.extend_from_slice(&sequence[downstream_start..downstream_end]);
    Some(window)
}

/// Structure window `sequence[start - left..start + right]`, start codon
/// included.
#[must_use]
pub fn structure_context(sequence: &[u8], start: usize, flanks: &Flanks) -> Option<Vec<u8>> {
    let window_start = start.checked_sub(flanks.left)?;
    let window_end = start.checked_add(flanks.right)?;
    if window_end > sequence.len() {
        return None;
    }
    Some(sequence[window_start..window_end].to_vec())
}
