//! Positional read aggregation over transcript intervals.

use crate::types::Interval;

/// Sum of read counts over `interval`, clipped to the profile
#[must_use]
pub fn read_sum(reads: &[u32], interval: &Interval) -> u64 {
    let end = interval.end.min(reads.len());
    let start = interval.start.min(end);
    reads[start..end].iter().map(|&count| u64::from(count)).sum()
}

/// Read sum after dropping the last `trim` positions of the interval
#[must_use]
pub fn trimmed_read_sum(reads: &[u32], interval: &Interval, trim: usize) -> u64 {
    read_sum(reads, &interval.trim_end(trim))
}

/// Trimmed reads per trimmed position. A fully trimmed interval divides by one.
#[must_use]
pub fn trimmed_read_density(reads: &[u32], interval: &Interval, trim: usize) -> f64 {
    let trimmed = interval.trim_end(trim);
    read_sum(reads, &trimmed) as f64 / trimmed.len().max(1) as f64
}

/// Translational efficiency of an interval: trimmed read density divided by
/// expression.
///
/// `None` when the expression is not strictly positive, since the ratio is
/// undefined there.
///
/// # Examples
///
/// ```rust
/// use tisfeat_core::features::reads::translational_efficiency;
/// use tisfeat_core::types::Interval;
///
/// let mut reads = vec![0u32; 30];
/// reads.extend(std::iter::repeat(1).take(60));
/// let te = translational_efficiency(&reads, &Interval::new(30, 90), 10, 2.0);
/// assert_eq!(te, Some(0.5));
/// ```
#[must_use]
pub fn translational_efficiency(
    reads: &[u32],
    interval: &Interval,
    trim: usize,
    expression: f64,
) -> Option<f64> {
    if !expression.is_finite() || expression <= 0.0 {
        return None;
    }
    Some(trimmed_read_density(reads, interval, trim) / expression)
}

/// Footprint of a set of possibly overlapping uORFs inside the 5'UTR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnionCoverage {
    /// Reads over every covered position, each position counted once
    pub reads: u64,
    /// Number of covered positions
    pub length: usize,
}

/// Union of the intervals restricted to `[0, cds_start)`, computed with a
/// per-position coverage mask.
///
/// Overlapping intervals contribute their shared positions once.
#[must_use]
pub fn uorf_union_coverage<'a, I>(reads: &[u32], uorfs: I, cds_start: usize) -> UnionCoverage
where
    I: IntoIterator<Item = &'a Interval>,
{
    let limit = cds_start.min(reads.len());
    let mut covered = vec![false; limit];
    for uorf in uorfs {
        let end = uorf.end.min(limit);
        let start = uorf.start.min(end);
        covered[start..end].fill(true);
    }

    covered
        .iter()
        .zip(reads)
        .filter(|(is_covered, _)| **is_covered)
        .fold(UnionCoverage::default(), |mut acc, (_, &count)| {
            acc.reads += u64::from(count);
            acc.length += 1;
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Vec<u32> {
        let mut reads = vec![0u32; 30];
        reads.extend(std::iter::repeat_n(1, 60));
        reads
    }

    #[test]
    fn test_read_sum_clips_to_profile() {
        let reads = vec![1, 2, 3, 4];
        assert_eq!(read_sum(&reads, &Interval::new(1, 3)), 5);
        assert_eq!(read_sum(&reads, &Interval::new(2, 10)), 7);
        assert_eq!(read_sum(&reads, &Interval::new(8, 10)), 0);
    }

    #[test]
    fn test_trimmed_sum_matches_hand_computation() {
        let reads = profile();
        assert_eq!(trimmed_read_sum(&reads, &Interval::new(30, 90), 10), 50);
        assert_eq!(trimmed_read_sum(&reads, &Interval::new(30, 35), 10), 0);
    }

    #[test]
    fn test_translational_efficiency_example() {
        let reads = profile();
        let te = translational_efficiency(&reads, &Interval::new(30, 90), 10, 2.0).unwrap();
        assert!((te - 0.5).abs() < 1e-12);
        assert!((te.ln_1p() - 0.5f64.ln_1p()).abs() < 1e-12);
    }

    #[test]
    fn test_translational_efficiency_requires_positive_expression() {
        let reads = profile();
        assert_eq!(
            translational_efficiency(&reads, &Interval::new(30, 90), 10, 0.0),
            None
        );
        assert_eq!(
            translational_efficiency(&reads, &Interval::new(30, 90), 10, f64::NAN),
            None
        );
    }

    #[test]
    fn test_fully_trimmed_interval_divides_by_one() {
        let reads = vec![5u32; 10];
        assert_eq!(trimmed_read_density(&reads, &Interval::new(2, 6), 10), 0.0);
    }

    #[test]
    fn test_union_of_overlapping_uorfs() {
        let reads = vec![1u32; 40];
        let uorfs = [Interval::new(0, 10), Interval::new(5, 15)];
        let union = uorf_union_coverage(&reads, &uorfs, 20);
        assert_eq!(union.length, 15);
        assert_eq!(union.reads, 15);
    }

    #[test]
    fn test_union_clipped_at_cds_start() {
        let reads: Vec<u32> = (0..40).collect();
        let uorfs = [Interval::new(15, 30)];
        let union = uorf_union_coverage(&reads, &uorfs, 20);
        assert_eq!(union.length, 5);
        assert_eq!(union.reads, 15 + 16 + 17 + 18 + 19);
    }

    #[test]
    fn test_union_without_uorfs_is_empty() {
        let reads = vec![3u32; 10];
        let union = uorf_union_coverage(&reads, std::iter::empty(), 8);
        assert_eq!(union, UnionCoverage::default());
    }
}
