//! Nucleotide helpers and the transcript sequence store.
//!
//! Sequences are handled as uppercase ASCII byte vectors over `A`, `C`, `G`,
//! `T`. Any other symbol is treated as ambiguous.

pub mod io;

pub use io::{InMemoryStore, IndexedFastaStore, SequenceStore, build_fasta_index};

use crate::constants::AMBIGUOUS_ROW;
use crate::types::Interval;

/// Row index of a real nucleotide in matrix order (A, T, C, G)
#[must_use]
pub const fn nucleotide_index(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'T' | b't' | b'U' | b'u' => Some(1),
        b'C' | b'c' => Some(2),
        b'G' | b'g' => Some(3),
        _ => None,
    }
}

/// Row index used while counting; every non-ACGT symbol lands in the
/// ambiguous row
#[must_use]
pub const fn count_row(base: u8) -> usize {
    match nucleotide_index(base) {
        Some(row) => row,
        None => AMBIGUOUS_ROW,
    }
}

/// Whether the sequence holds any symbol outside A, C, G, T (N included)
#[must_use]
pub fn has_ambiguous_base(sequence: &[u8]) -> bool {
    sequence.iter().any(|&base| nucleotide_index(base).is_none())
}

/// Uppercase the sequence in place and write RNA uracil as thymine
pub fn normalize_sequence(sequence: &mut [u8]) {
    for base in sequence.iter_mut() {
        *base = match base.to_ascii_uppercase() {
            b'U' => b'T',
            upper => upper,
        };
    }
}

#[must_use]
pub const fn is_gc(base: u8) -> bool {
    matches!(base, b'G' | b'g' | b'C' | b'c')
}

/// Fraction of G and C over `interval`, clipped to the sequence.
///
/// Returns 0.0 for an empty interval.
#[must_use]
pub fn gc_fraction(sequence: &[u8], interval: &Interval) -> f64 {
    let end = interval.end.min(sequence.len());
    let start = interval.start.min(end);
    let span = &sequence[start..end];
    if span.is_empty() {
        return 0.0;
    }
    let gc = span.iter().filter(|&&base| is_gc(base)).count();
    gc as f64 / span.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NUCLEOTIDES;

    #[test]
    fn test_nucleotide_index_follows_matrix_order() {
        for (row, &base) in NUCLEOTIDES.iter().enumerate() {
            assert_eq!(nucleotide_index(base), Some(row));
        }
        assert_eq!(nucleotide_index(b'g'), Some(3));
        assert_eq!(nucleotide_index(b'U'), Some(1));
        assert_eq!(nucleotide_index(b'N'), None);
    }

    #[test]
    fn test_count_row_sends_ambiguous_to_last_row() {
        assert_eq!(count_row(b'C'), 2);
        assert_eq!(count_row(b'N'), AMBIGUOUS_ROW);
        assert_eq!(count_row(b'R'), AMBIGUOUS_ROW);
    }

    #[test]
    fn test_has_ambiguous_base() {
        assert!(!has_ambiguous_base(b"ACGTACGT"));
        assert!(has_ambiguous_base(b"ACGNACGT"));
        assert!(has_ambiguous_base(b"n"));
        assert!(!has_ambiguous_base(b""));
    }

    #[test]
    fn test_normalize_sequence() {
        let mut seq = b"acguNt".to_vec();
        normalize_sequence(&mut seq);
        assert_eq!(seq, b"ACGTNT");
    }

    #[test]
    fn test_gc_fraction_empty_interval_is_zero() {
        assert_eq!(gc_fraction(b"GGCC", &Interval::new(2, 2)), 0.0);
        assert_eq!(gc_fraction(b"", &Interval::new(0, 0)), 0.0);
    }

    #[test]
    fn test_gc_fraction_bounds() {
        let seq = b"AAGGCCTT";
        assert_eq!(gc_fraction(seq, &Interval::new(0, 8)), 0.5);
        assert_eq!(gc_fraction(seq, &Interval::new(2, 6)), 1.0);
        assert_eq!(gc_fraction(seq, &Interval::new(0, 2)), 0.0);
        let value = gc_fraction(seq, &Interval::new(1, 5));
        assert!((0.0..=1.0).contains(&value));
    }

    #[test]
    fn test_gc_fraction_clips_to_sequence() {
        assert_eq!(gc_fraction(b"GC", &Interval::new(0, 10)), 1.0);
        assert_eq!(gc_fraction(b"GC", &Interval::new(5, 10)), 0.0);
    }
}
