use crate::types::{Interval, OrfRegion};

/// One character per ORF, in input order, locating each ORF start relative
/// to the CDS.
///
/// # Examples
///
/// ```rust
/// use tisfeat_core::features::orfs::classification_string;
/// use tisfeat_core::types::Interval;
///
/// let cds = Interval::new(50, 80);
/// let orfs = [10, 50, 60, 90].map(|start| Interval::new(start, start + 30));
/// assert_eq!(classification_string(&orfs, &cds), "5CI3");
/// ```
#[must_use]
pub fn classification_string(orfs: &[Interval], cds: &Interval) -> String {
    orfs.iter()
        .map(|orf| OrfRegion::classify(orf.start, cds).as_char())
        .collect()
}

/// Signed distance from an ORF end to the CDS start; negative when the ORF
/// runs into the CDS
#[must_use]
pub fn end_to_cds(orf: &Interval, cds: &Interval) -> i64 {
    cds.start as i64 - orf.end as i64
}
