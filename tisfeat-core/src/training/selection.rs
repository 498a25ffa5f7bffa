use crate::config::FeatureConfig;
use crate::features::reads::translational_efficiency;
use crate::types::TranscriptRecord;

/// Matrix pair a training example contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingSet {
    Cds,
    Uorf,
}

/// Start position and weight a transcript contributes to training
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingExample {
    pub set: TrainingSet,
    /// Start codon position whose motif window is counted
    pub start: usize,
    /// `log1p` of the transcript's CDS translational efficiency
    pub weight: f64,
}

/// Decide whether and how a transcript enters training.
///
/// A transcript trains the CDS matrices when its 5'UTR is at least
/// `min_utr5_length` long, its expression reaches `min_expression` and it has
/// no uORF. It trains the uORF matrices when it has exactly one uORF that
/// ends before the CDS, is longer than `min_uorf_length` and starts beyond
/// `min_uorf_distance`. Transcripts without a positive expression never
/// train, since their efficiency is undefined.
#[must_use]
pub fn select_training_example(
    record: &TranscriptRecord,
    config: &FeatureConfig,
) -> Option<TrainingExample> {
    let te = translational_efficiency(
        &record.reads,
        &record.cds,
        config.end_trim,
        record.expression,
    )?;
    let weight = te.ln_1p();

    let mut uorfs = record.uorfs();
    match (uorfs.next(), uorfs.next()) {
        (None, _) => (record.cds.start >= config.min_utr5_length
            && record.expression >= config.min_expression)
            .then_some(TrainingExample {
                set: TrainingSet::Cds,
                start: record.cds.start,
                weight,
            }),
        (Some(uorf), None) => (uorf.end <= record.cds.start
            && uorf.len() > config.min_uorf_length
            && uorf.start > config.min_uorf_distance)
            .then_some(TrainingExample {
                set: TrainingSet::Uorf,
                start: uorf.start,
                weight,
            }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Interval;

    fn example_record() -> TranscriptRecord {
        let mut reads = vec![0u32; 30];
        reads.extend(std::iter::repeat_n(1, 60));
        TranscriptRecord {
            transcript_id: "tx1".to_string(),
            gene_id: "g1".to_string(),
            gene_name: "GENE1".to_string(),
            expression: 2.0,
            reads,
            cds: Interval::new(30, 90),
            orfs: vec![Interval::new(5, 25), Interval::new(30, 90)],
        }
    }

    fn permissive_config() -> FeatureConfig {
        FeatureConfig {
            min_utr5_length: 10,
            min_expression: 1.0,
            end_trim: 10,
            min_uorf_length: 9,
            min_uorf_distance: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_uorf_transcript_trains_uorf_matrices() {
        let example = select_training_example(&example_record(), &permissive_config()).unwrap();
        assert_eq!(example.set, TrainingSet::Uorf);
        assert_eq!(example.start, 5);
        assert!((example.weight - 0.5f64.ln_1p()).abs() < 1e-12);
    }

    #[test]
    fn test_uorf_distance_gate() {
        let config = FeatureConfig {
            min_uorf_distance: 5,
            ..permissive_config()
        };
        assert!(select_training_example(&example_record(), &config).is_none());
    }

    #[test]
    fn test_uorf_length_gate_is_strict() {
        let config = FeatureConfig {
            min_uorf_length: 20,
            ..permissive_config()
        };
        assert!(select_training_example(&example_record(), &config).is_none());
    }

    #[test]
    fn test_uorf_overlapping_cds_is_excluded() {
        let mut record = example_record();
        record.orfs = vec![Interval::new(5, 40)];
        assert!(select_training_example(&record, &permissive_config()).is_none());
    }

    #[test]
    fn test_two_uorfs_are_excluded() {
        let mut record = example_record();
        record.orfs = vec![Interval::new(2, 14), Interval::new(15, 28)];
        assert!(select_training_example(&record, &permissive_config()).is_none());
    }

    #[test]
    fn test_uorf_free_transcript_trains_cds_matrices() {
        let mut record = example_record();
        record.orfs = vec![Interval::new(30, 90)];
        let example = select_training_example(&record, &permissive_config()).unwrap();
        assert_eq!(example.set, TrainingSet::Cds);
        assert_eq!(example.start, 30);
        assert!((example.weight - 0.5f64.ln_1p()).abs() < 1e-12);
    }

    #[test]
    fn test_cds_gates() {
        let mut record = example_record();
        record.orfs.clear();

        let short_utr = FeatureConfig {
            min_utr5_length: 31,
            ..permissive_config()
        };
        assert!(select_training_example(&record, &short_utr).is_none());

        let high_expression = FeatureConfig {
            min_expression: 2.5,
            ..permissive_config()
        };
        assert!(select_training_example(&record, &high_expression).is_none());

        let exact = FeatureConfig {
            min_utr5_length: 30,
            min_expression: 2.0,
            ..permissive_config()
        };
        assert!(select_training_example(&record, &exact).is_some());
    }

    #[test]
    fn test_zero_expression_never_trains() {
        let mut record = example_record();
        record.orfs.clear();
        record.expression = 0.0;
        let config = FeatureConfig {
            min_expression: 0.0,
            ..permissive_config()
        };
        assert!(select_training_example(&record, &config).is_none());
    }
}
