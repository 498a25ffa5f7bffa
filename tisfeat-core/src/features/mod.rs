//! Per-transcript feature extraction.
//!
//! [`extract_features`] turns one annotation record and its sequence into a
//! [`TranscriptFeatures`] row. Records are independent of each other, and
//! the trained model and the predictor are only read, so rows can be
//! computed in parallel.
//!
//! Windows that do not fit inside the transcript stay `None` all the way to
//! the writers; they are never scored or folded.

pub mod orfs;
pub mod reads;

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::Serialize;

use crate::config::FeatureConfig;
use crate::context::{motif_context, structure_context};
use crate::scoring::ScoringMatrix;
use crate::sequence::{gc_fraction, has_ambiguous_base};
use crate::structure::StructurePredictor;
use crate::training::MotifModel;
use crate::types::{Interval, OrfRegion, TisFeatError, TranscriptRecord};

use orfs::{classification_string, end_to_cds};
use reads::{
    UnionCoverage, read_sum, translational_efficiency, trimmed_read_sum, uorf_union_coverage,
};

/// Features of one ORF start
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrfFeatures {
    pub start: usize,
    pub end: usize,
    pub length: usize,
    pub region: OrfRegion,
    /// Reads over the ORF with the end trim applied
    pub reads: u64,
    /// CDS start minus ORF end
    pub end_to_cds: i64,
    /// Motif window, `None` when out of bounds
    pub context: Option<String>,
    /// Score under the TE-weighted matrix
    pub wrent: Option<f64>,
    /// Score under the unweighted matrix
    pub urent: Option<f64>,
    /// Ensemble free energy of the upstream-weighted structure window
    pub efe_upstream: Option<f64>,
    /// Ensemble free energy of the downstream-weighted structure window
    pub efe_downstream: Option<f64>,
}

impl OrfFeatures {
    /// Windows of this ORF that could not be extracted (0 to 3)
    #[must_use]
    pub fn invalid_windows(&self, structure_predicted: bool) -> usize {
        let motif = usize::from(self.context.is_none());
        if !structure_predicted {
            return motif;
        }
        motif
            + usize::from(self.efe_upstream.is_none())
            + usize::from(self.efe_downstream.is_none())
    }
}

/// One output row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptFeatures {
    pub transcript_id: String,
    pub gene_id: String,
    pub gene_name: String,
    pub expression: f64,
    pub utr5_length: usize,
    pub utr3_length: usize,
    pub cds_length: usize,
    pub utr5_reads: u64,
    pub utr5_reads_trimmed: u64,
    pub utr5_gc: f64,
    pub cds_gc: f64,
    pub cds_reads: u64,
    /// `None` for transcripts without positive expression
    pub cds_te: Option<f64>,
    pub uorf_count: usize,
    pub uorf_union_reads: u64,
    pub uorf_union_length: usize,
    pub uorfs: Vec<OrfFeatures>,
    pub cds: OrfFeatures,
    pub orfs: Vec<OrfFeatures>,
    /// Region code of every ORF, see [`classification_string`]
    pub orf_types: String,
}

/// Fails unless the sequence covers exactly the read profile
pub fn check_sequence_length(
    record: &TranscriptRecord,
    sequence: &[u8],
) -> Result<(), TisFeatError> {
    if sequence.len() != record.length() {
        return Err(TisFeatError::LengthMismatch {
            transcript: record.transcript_id.clone(),
            profile: record.length(),
            sequence: sequence.len(),
        });
    }
    Ok(())
}

struct OrfWindows {
    orf: Interval,
    motif: Option<Vec<u8>>,
    upstream: Option<Vec<u8>>,
    downstream: Option<Vec<u8>>,
}

impl OrfWindows {
    fn extract(sequence: &[u8], orf: Interval, config: &FeatureConfig) -> Self {
        Self {
            orf,
            motif: motif_context(sequence, orf.start, &config.motif_flanks),
            upstream: structure_context(sequence, orf.start, &config.structure_flanks_upstream),
            downstream: structure_context(
                sequence,
                orf.start,
                &config.structure_flanks_downstream,
            ),
        }
    }

    fn structure_windows(&self) -> impl Iterator<Item = &[u8]> {
        [self.upstream.as_deref(), self.downstream.as_deref()]
            .into_iter()
            .flatten()
    }
}

/// Energies of the distinct structure windows of one transcript
#[derive(Default)]
struct EnergyTable {
    energies: HashMap<Vec<u8>, f64>,
}

impl EnergyTable {
    fn predict<'w>(
        predictor: &dyn StructurePredictor,
        windows: impl Iterator<Item = &'w [u8]>,
    ) -> Result<Self, TisFeatError> {
        let mut distinct: Vec<Vec<u8>> = Vec::new();
        let mut seen: HashSet<&[u8]> = HashSet::new();
        for window in windows {
            if seen.insert(window) {
                distinct.push(window.to_vec());
            }
        }
        let values = predictor.ensemble_free_energies(&distinct)?;
        Ok(Self {
            energies: distinct.into_iter().zip(values).collect(),
        })
    }

    fn get(&self, window: Option<&[u8]>) -> Option<f64> {
        window.and_then(|w| self.energies.get(w).copied())
    }
}

fn score_window(
    matrix: &ScoringMatrix,
    window: Option<&[u8]>,
) -> Result<Option<f64>, TisFeatError> {
    window.map(|w| matrix.score(w)).transpose()
}

fn build_orf_features(
    windows: &OrfWindows,
    record: &TranscriptRecord,
    model: &MotifModel,
    config: &FeatureConfig,
    energies: &EnergyTable,
) -> Result<OrfFeatures, TisFeatError> {
    let orf = windows.orf;
    let motif = windows.motif.as_deref();
    Ok(OrfFeatures {
        start: orf.start,
        end: orf.end,
        length: orf.len(),
        region: OrfRegion::classify(orf.start, &record.cds),
        reads: trimmed_read_sum(&record.reads, &orf, config.end_trim),
        end_to_cds: end_to_cds(&orf, &record.cds),
        context: motif.map(|w| String::from_utf8_lossy(w).into_owned()),
        wrent: score_window(&model.weighted, motif)?,
        urent: score_window(&model.unweighted, motif)?,
        efe_upstream: energies.get(windows.upstream.as_deref()),
        efe_downstream: energies.get(windows.downstream.as_deref()),
    })
}

/// Compute the feature row of one transcript.
///
/// Returns `Ok(None)` when the sequence holds an ambiguous base; such
/// transcripts are filtered, not failed. Without a predictor every energy is
/// `None`.
///
/// # Errors
///
/// Returns [`TisFeatError::InvalidRecord`] for intervals that do not fit the
/// read profile, [`TisFeatError::LengthMismatch`] when the sequence and the read
/// profile disagree, [`TisFeatError::WindowWidthMismatch`] when the model
/// was trained for a different motif window, and any predictor failure.
pub fn extract_features(
    record: &TranscriptRecord,
    sequence: &[u8],
    model: &MotifModel,
    config: &FeatureConfig,
    predictor: Option<&dyn StructurePredictor>,
) -> Result<Option<TranscriptFeatures>, TisFeatError> {
    if has_ambiguous_base(sequence) {
        debug!("{}: ambiguous base in sequence, skipped", record.transcript_id);
        return Ok(None);
    }
    record.validate()?;
    check_sequence_length(record, sequence)?;

    let orf_windows: Vec<OrfWindows> = record
        .orfs
        .iter()
        .map(|orf| OrfWindows::extract(sequence, *orf, config))
        .collect();
    let cds_windows = OrfWindows::extract(sequence, record.cds, config);

    let energies = match predictor {
        Some(predictor) => EnergyTable::predict(
            predictor,
            orf_windows
                .iter()
                .chain(std::iter::once(&cds_windows))
                .flat_map(|windows| windows.structure_windows()),
        )?,
        None => EnergyTable::default(),
    };

    let orfs = orf_windows
        .iter()
        .map(|windows| build_orf_features(windows, record, model, config, &energies))
        .collect::<Result<Vec<_>, _>>()?;
    let cds = build_orf_features(&cds_windows, record, model, config, &energies)?;
    let uorfs: Vec<OrfFeatures> = orfs
        .iter()
        .filter(|orf| orf.region == OrfRegion::FivePrimeUtr)
        .cloned()
        .collect();

    let utr5 = Interval::new(0, record.cds.start);
    let UnionCoverage {
        reads: uorf_union_reads,
        length: uorf_union_length,
    } = uorf_union_coverage(&record.reads, record.uorfs(), record.cds.start);

    Ok(Some(TranscriptFeatures {
        transcript_id: record.transcript_id.clone(),
        gene_id: record.gene_id.clone(),
        gene_name: record.gene_name.clone(),
        expression: record.expression,
        utr5_length: record.cds.start,
        utr3_length: record.length() - record.cds.end,
        cds_length: record.cds.len(),
        utr5_reads: read_sum(&record.reads, &utr5),
        utr5_reads_trimmed: trimmed_read_sum(&record.reads, &utr5, config.end_trim),
        utr5_gc: gc_fraction(sequence, &utr5),
        cds_gc: gc_fraction(sequence, &record.cds),
        cds_reads: cds.reads,
        cds_te: translational_efficiency(
            &record.reads,
            &record.cds,
            config.end_trim,
            record.expression,
        ),
        uorf_count: uorfs.len(),
        uorf_union_reads,
        uorf_union_length,
        uorfs,
        cds,
        orfs,
        orf_types: classification_string(&record.orfs, &record.cds),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Flanks;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPredictor {
        calls: AtomicUsize,
        windows: AtomicUsize,
    }

    impl CountingPredictor {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                windows: AtomicUsize::new(0),
            }
        }
    }

    impl StructurePredictor for CountingPredictor {
        fn ensemble_free_energy(&self, sequence: &[u8]) -> Result<f64, TisFeatError> {
            Ok(-(sequence.len() as f64) / 10.0)
        }

        fn ensemble_free_energies(
            &self,
            sequences: &[Vec<u8>],
        ) -> Result<Vec<f64>, TisFeatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.windows.fetch_add(sequences.len(), Ordering::SeqCst);
            sequences
                .iter()
                .map(|s| self.ensemble_free_energy(s))
                .collect()
        }
    }

    fn model(width: usize) -> MotifModel {
        MotifModel {
            weighted: ScoringMatrix::from_columns(vec![[1.0, 0.0, 0.0, 0.0]; width]),
            unweighted: ScoringMatrix::from_columns(vec![[0.0, 0.0, 0.0, 0.5]; width]),
        }
    }

    fn config() -> FeatureConfig {
        FeatureConfig {
            motif_flanks: Flanks::new(2, 2),
            structure_flanks_upstream: Flanks::new(4, 2),
            structure_flanks_downstream: Flanks::new(2, 4),
            end_trim: 2,
            ..Default::default()
        }
    }

    fn record() -> TranscriptRecord {
        TranscriptRecord {
            transcript_id: "tx1".to_string(),
            gene_id: "g1".to_string(),
            gene_name: "GENE1".to_string(),
            expression: 2.0,
            reads: (0..40).map(|i| if i < 20 { 1 } else { 2 }).collect(),
            cds: Interval::new(20, 32),
            orfs: vec![
                Interval::new(1, 10),
                Interval::new(6, 15),
                Interval::new(20, 32),
                Interval::new(24, 30),
                Interval::new(35, 40),
            ],
        }
    }

    fn sequence() -> Vec<u8> {
        b"AATGCATGGGCCAAGGTTCCATGAAAGGGCCCTTTAAAGG".to_vec()
    }

    #[test]
    fn test_extract_transcript_scalars() {
        let features = extract_features(&record(), &sequence(), &model(4), &config(), None)
            .unwrap()
            .unwrap();
        assert_eq!(features.utr5_length, 20);
        assert_eq!(features.utr3_length, 8);
        assert_eq!(features.cds_length, 12);
        assert_eq!(features.utr5_reads, 20);
        assert_eq!(features.utr5_reads_trimmed, 18);
        assert_eq!(features.cds_reads, 20);
        assert_eq!(features.cds_te, Some(20.0 / 10.0 / 2.0));
        assert_eq!(features.uorf_count, 2);
        assert_eq!(features.uorf_union_length, 14);
        assert_eq!(features.uorf_union_reads, 14);
        assert_eq!(features.orf_types, "55CI3");
        assert!((0.0..=1.0).contains(&features.utr5_gc));
    }

    #[test]
    fn test_extract_orf_groups() {
        let features = extract_features(&record(), &sequence(), &model(4), &config(), None)
            .unwrap()
            .unwrap();
        assert_eq!(features.orfs.len(), 5);
        let starts: Vec<usize> = features.uorfs.iter().map(|orf| orf.start).collect();
        assert_eq!(starts, vec![1, 6]);
        assert_eq!(features.uorfs[0].end_to_cds, 10);
        assert_eq!(features.cds.start, 20);
        assert_eq!(features.cds.region, OrfRegion::Cds);

        // start 1 cannot fit two upstream nucleotides
        assert_eq!(features.uorfs[0].context, None);
        assert_eq!(features.uorfs[0].wrent, None);
        assert_eq!(features.uorfs[1].context.as_deref(), Some("CAGC"));
        assert_eq!(features.uorfs[1].wrent, Some(1.0));
        assert_eq!(features.uorfs[1].urent, Some(0.5));
        assert_eq!(features.uorfs[1].efe_upstream, None);
    }

    #[test]
    fn test_ambiguous_sequence_is_skipped() {
        let mut seq = sequence();
        seq[5] = b'N';
        let result = extract_features(&record(), &seq, &model(4), &config(), None).unwrap();
        assert!(result.is_none());

        let mut seq = sequence();
        seq[30] = b'R';
        let result = extract_features(&record(), &seq, &model(4), &config(), None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_cds_past_profile_is_invalid_record() {
        let mut record = record();
        record.cds = Interval::new(20, 50);
        assert!(matches!(
            extract_features(&record, &sequence(), &model(4), &config(), None),
            Err(TisFeatError::InvalidRecord { .. })
        ));

        record.cds = Interval::new(20, 32);
        record.orfs.push(Interval::new(12, 12));
        assert!(matches!(
            extract_features(&record, &sequence(), &model(4), &config(), None),
            Err(TisFeatError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_length_mismatch_is_fatal() {
        let seq = &sequence()[..39];
        assert!(matches!(
            extract_features(&record(), seq, &model(4), &config(), None),
            Err(TisFeatError::LengthMismatch {
                profile: 40,
                sequence: 39,
                ..
            })
        ));
    }

    #[test]
    fn test_model_width_mismatch_is_fatal() {
        assert!(matches!(
            extract_features(&record(), &sequence(), &model(6), &config(), None),
            Err(TisFeatError::WindowWidthMismatch { .. })
        ));
    }

    #[test]
    fn test_structure_windows_folded_once_per_transcript() {
        let predictor = CountingPredictor::new();
        let features = extract_features(
            &record(),
            &sequence(),
            &model(4),
            &config(),
            Some(&predictor),
        )
        .unwrap()
        .unwrap();
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
        // the CDS appears both as ORF and as CDS; its windows are folded once
        assert_eq!(predictor.windows.load(Ordering::SeqCst), 8);
        assert_eq!(features.cds.efe_upstream, Some(-0.6));
        assert_eq!(features.orfs[2].efe_downstream, features.cds.efe_downstream);
        assert_eq!(features.uorfs[0].efe_upstream, None);
        assert_eq!(features.uorfs[0].invalid_windows(true), 3);
        assert_eq!(features.uorfs[0].invalid_windows(false), 1);
        assert_eq!(features.orfs[4].invalid_windows(true), 0);
    }
}
