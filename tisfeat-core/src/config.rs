use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_DEGENERATE_SCORE, DEFAULT_END_TRIM, DEFAULT_MIN_EXPRESSION,
    DEFAULT_MIN_UORF_DISTANCE, DEFAULT_MIN_UORF_LENGTH, DEFAULT_MIN_UTR5_LENGTH,
    DEFAULT_MOTIF_LEFT_FLANK, DEFAULT_MOTIF_RIGHT_FLANK, DEFAULT_PREDICTOR_RETRIES,
    DEFAULT_STRUCTURE_DOWNSTREAM_FLANKS, DEFAULT_STRUCTURE_UPSTREAM_FLANKS,
};
use crate::context::Flanks;
use crate::types::TisFeatError;

/// Output format of the feature table.
///
/// # Formats
///
/// - **Tsv**: tab-separated table, per-ORF values joined with commas in one cell
/// - **Jsonl**: one JSON object per transcript, per-ORF values as nested arrays
///
/// # Examples
///
/// ```rust
/// use tisfeat_core::config::{FeatureConfig, OutputFormat};
///
/// let config = FeatureConfig {
///     output_format: OutputFormat::Jsonl,
///     ..Default::default()
/// };
/// assert_eq!(config.output_format.extension(), "jsonl");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Legacy tab-separated table with comma-joined list cells.
    ///
    /// Byte-compatible with downstream readers that split list cells on ','.
    #[default]
    Tsv,

    /// JSON Lines with typed nested per-ORF records.
    Jsonl,
}

impl OutputFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Tsv => "tsv",
            Self::Jsonl => "jsonl",
        }
    }
}

/// Parameters of both passes.
///
/// Every threshold and window shape used by training and extraction is read
/// from this struct; the [`Default`] values are only a convenience for
/// callers that do not set a field.
///
/// # Examples
///
/// ```rust
/// use tisfeat_core::config::FeatureConfig;
/// use tisfeat_core::context::Flanks;
///
/// let config = FeatureConfig {
///     motif_flanks: Flanks::new(6, 4),
///     end_trim: 10,
///     num_threads: Some(4),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Minimum 5'UTR length (CDS start) for CDS-context training.
    ///
    /// **Default**: 50
    pub min_utr5_length: usize,

    /// Minimum gene expression (FPKM) for CDS-context training.
    ///
    /// **Default**: 1.0
    pub min_expression: f64,

    /// Motif window around the start codon; the codon itself is excluded.
    ///
    /// **Default**: 10 upstream, 5 downstream
    pub motif_flanks: Flanks,

    /// Upstream-weighted structure window, start codon included.
    ///
    /// **Default**: 50 upstream, 10 downstream
    pub structure_flanks_upstream: Flanks,

    /// Downstream-weighted structure window, start codon included.
    ///
    /// **Default**: 10 upstream, 50 downstream
    pub structure_flanks_downstream: Flanks,

    /// Positions dropped before an ORF end when summing reads, guarding
    /// against read pile-up at termination.
    ///
    /// **Default**: 15
    pub end_trim: usize,

    /// uORFs must be strictly longer than this to enter uORF-context training.
    ///
    /// **Default**: 9
    pub min_uorf_length: usize,

    /// uORF start must lie strictly beyond this distance from the transcript
    /// start to enter uORF-context training.
    ///
    /// **Default**: 20
    pub min_uorf_distance: usize,

    /// Score of every base in a motif column without observations, and of a
    /// base whose background probability is zero. A base never observed in
    /// an observed column always scores `-inf`.
    ///
    /// **Default**: 0.0
    pub degenerate_score: f64,

    /// Transcripts fetched and processed per parallel chunk. Output rows are
    /// flushed once per chunk.
    ///
    /// **Default**: 1000
    pub chunk_size: usize,

    /// Rayon worker threads; `None` uses every available core.
    ///
    /// **Default**: `None`
    pub num_threads: Option<usize>,

    /// Extra attempts for a transcript whose extraction fails before the run
    /// is aborted.
    ///
    /// **Default**: 1
    pub predictor_retries: usize,

    /// Feature table format.
    ///
    /// **Default**: [`OutputFormat::Tsv`]
    pub output_format: OutputFormat,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_utr5_length: DEFAULT_MIN_UTR5_LENGTH,
            min_expression: DEFAULT_MIN_EXPRESSION,
            motif_flanks: Flanks::new(DEFAULT_MOTIF_LEFT_FLANK, DEFAULT_MOTIF_RIGHT_FLANK),
            structure_flanks_upstream: Flanks::new(
                DEFAULT_STRUCTURE_UPSTREAM_FLANKS.0,
                DEFAULT_STRUCTURE_UPSTREAM_FLANKS.1,
            ),
            structure_flanks_downstream: Flanks::new(
                DEFAULT_STRUCTURE_DOWNSTREAM_FLANKS.0,
                DEFAULT_STRUCTURE_DOWNSTREAM_FLANKS.1,
            ),
            end_trim: DEFAULT_END_TRIM,
            min_uorf_length: DEFAULT_MIN_UORF_LENGTH,
            min_uorf_distance: DEFAULT_MIN_UORF_DISTANCE,
            degenerate_score: DEFAULT_DEGENERATE_SCORE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            num_threads: None,
            predictor_retries: DEFAULT_PREDICTOR_RETRIES,
            output_format: OutputFormat::Tsv,
        }
    }
}

impl FeatureConfig {
    /// Checks values that would make either pass meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::InvalidConfig`] for an empty motif or structure
    /// window, a zero chunk size, a NaN degenerate score, or a negative or
    /// non-finite expression threshold.
    pub fn validate(&self) -> Result<(), TisFeatError> {
        if self.motif_flanks.width() == 0 {
            return Err(TisFeatError::InvalidConfig(
                "motif window must cover at least one nucleotide".to_string(),
            ));
        }
        if self.structure_flanks_upstream.width() == 0
            || self.structure_flanks_downstream.width() == 0
        {
            return Err(TisFeatError::InvalidConfig(
                "structure windows must cover at least one nucleotide".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(TisFeatError::InvalidConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        if self.degenerate_score.is_nan() {
            return Err(TisFeatError::InvalidConfig(
                "degenerate score must not be NaN".to_string(),
            ));
        }
        if !self.min_expression.is_finite() || self.min_expression < 0.0 {
            return Err(TisFeatError::InvalidConfig(format!(
                "minimum expression must be a non-negative number, got {}",
                self.min_expression
            )));
        }
        if self.num_threads == Some(0) {
            return Err(TisFeatError::InvalidConfig(
                "thread count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FeatureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output_format, OutputFormat::Tsv);
        assert_eq!(config.motif_flanks.width(), 15);
    }

    #[test]
    fn test_zero_width_motif_rejected() {
        let config = FeatureConfig {
            motif_flanks: Flanks::new(0, 0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TisFeatError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = FeatureConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_degenerate_score_rejected() {
        let config = FeatureConfig {
            degenerate_score: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_infinity_degenerate_score_allowed() {
        let config = FeatureConfig {
            degenerate_score: f64::NEG_INFINITY,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_format_extension() {
        assert_eq!(OutputFormat::Tsv.extension(), "tsv");
        assert_eq!(OutputFormat::Jsonl.extension(), "jsonl");
    }
}
