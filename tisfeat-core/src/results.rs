use std::fmt;

use crate::constants::{NUCLEOTIDES, NUM_BASES};

/// Outcome of the training pass.
///
/// # Examples
///
/// ```rust,no_run
/// use tisfeat_core::engine::UntrainedPipeline;
/// use tisfeat_core::sequence::InMemoryStore;
///
/// let records = tisfeat_core::annotation::read_annotation_file("annotation.tsv")?;
/// let mut store = InMemoryStore::from_fasta("transcripts.fa")?;
/// let (trained, summary) = UntrainedPipeline::new().train(&records, &mut store)?;
/// println!("{summary}");
/// # Ok::<(), tisfeat_core::types::TisFeatError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Annotation records seen
    pub records: usize,
    /// Transcripts accumulated into the CDS matrices
    pub cds_examples: usize,
    /// Transcripts accumulated into the uORF matrices
    pub uorf_examples: usize,
    /// Selected transcripts whose motif window did not fit
    pub invalid_windows: usize,
    /// Background distribution in A, T, C, G order
    pub background: [f64; NUM_BASES],
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} CDS examples, {} uORF examples, {} out-of-bounds windows; background",
            self.records, self.cds_examples, self.uorf_examples, self.invalid_windows
        )?;
        for (base, probability) in NUCLEOTIDES.iter().zip(&self.background) {
            write!(f, " {}={:.4}", char::from(*base), probability)?;
        }
        Ok(())
    }
}

/// Outcome of the extraction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Annotation records seen
    pub records: usize,
    /// Records already present in a resumed output table
    pub already_done: usize,
    /// Records skipped for an ambiguous base in their sequence
    pub ambiguous: usize,
    /// Rows written in this run
    pub rows_written: usize,
    /// Windows that could not be extracted, summed over every ORF and the CDS
    pub invalid_windows: usize,
    /// Transcripts that needed more than one attempt
    pub retried: usize,
    /// Whether the run stopped early on request
    pub interrupted: bool,
}

impl fmt::Display for ExtractionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records: {} rows written, {} already done, {} skipped (ambiguous base), \
             {} out-of-bounds windows, {} retried",
            self.records,
            self.rows_written,
            self.already_done,
            self.ambiguous,
            self.invalid_windows,
            self.retried
        )?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_summary_display() {
        let summary = TrainingSummary {
            records: 10,
            cds_examples: 4,
            uorf_examples: 2,
            invalid_windows: 1,
            background: [0.25; NUM_BASES],
        };
        let text = summary.to_string();
        assert!(text.starts_with("10 records, 4 CDS examples, 2 uORF examples"));
        assert!(text.ends_with("A=0.2500 T=0.2500 C=0.2500 G=0.2500"));
    }

    #[test]
    fn test_extraction_summary_display_marks_interruption() {
        let summary = ExtractionSummary {
            records: 3,
            rows_written: 1,
            interrupted: true,
            ..Default::default()
        };
        assert!(summary.to_string().ends_with("(interrupted)"));
    }
}
