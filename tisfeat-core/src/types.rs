use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Half-open interval `[start, end)` in transcript-relative coordinates.
///
/// Used for the annotated CDS as well as every ORF of a transcript. The
/// coordinate system is zero-based, so the start codon of an interval occupies
/// `start..start + 3`.
///
/// # Examples
///
/// ```rust
/// use tisfeat_core::types::Interval;
///
/// let orf = Interval::new(30, 90);
/// assert_eq!(orf.len(), 60);
/// assert_eq!(orf.trim_end(10), Interval::new(30, 80));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Interval {
    /// First position covered by the interval
    pub start: usize,
    /// One past the last position covered by the interval
    pub end: usize,
}

impl Interval {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of positions covered, zero for inverted intervals
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the two intervals share at least one position
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Drops the last `trim` positions. The result never starts before
    /// `start`, so heavily trimmed intervals collapse to an empty interval.
    #[must_use]
    pub fn trim_end(&self, trim: usize) -> Self {
        Self {
            start: self.start,
            end: self.end.saturating_sub(trim).max(self.start),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Location of an ORF start relative to the annotated CDS.
///
/// Rendered as one character per ORF in the classification string of the
/// feature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OrfRegion {
    /// Starts upstream of the CDS start (uORF)
    FivePrimeUtr,
    /// Shares its start with the CDS
    Cds,
    /// Starts strictly inside the CDS
    CdsInternal,
    /// Starts at or after the CDS end
    ThreePrimeUtr,
}

impl OrfRegion {
    /// Classify an ORF by its start position. A start equal to the CDS start
    /// is always the CDS, even for an empty CDS.
    #[must_use]
    pub const fn classify(orf_start: usize, cds: &Interval) -> Self {
        if orf_start == cds.start {
            Self::Cds
        } else if orf_start < cds.start {
            Self::FivePrimeUtr
        } else if orf_start < cds.end {
            Self::CdsInternal
        } else {
            Self::ThreePrimeUtr
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::FivePrimeUtr => '5',
            Self::Cds => 'C',
            Self::CdsInternal => 'I',
            Self::ThreePrimeUtr => '3',
        }
    }
}

impl fmt::Display for OrfRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One row of the input annotation table.
///
/// ORF coordinates are always held as a collection, even for transcripts
/// carrying a single ORF.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRecord {
    /// Transcript identifier, unique within a table
    pub transcript_id: String,
    /// Gene identifier
    pub gene_id: String,
    /// Gene symbol
    pub gene_name: String,
    /// Gene expression in FPKM
    pub expression: f64,
    /// Ribosome footprint count at every transcript position
    pub reads: Vec<u32>,
    /// Annotated coding sequence
    pub cds: Interval,
    /// Every ORF of the transcript, in input order
    pub orfs: Vec<Interval>,
}

impl TranscriptRecord {
    /// Transcript length as given by the read profile
    #[must_use]
    pub fn length(&self) -> usize {
        self.reads.len()
    }

    /// ORFs starting upstream of the CDS, in input order
    pub fn uorfs(&self) -> impl Iterator<Item = &Interval> {
        self.orfs.iter().filter(|orf| orf.start < self.cds.start)
    }

    #[must_use]
    pub fn uorf_count(&self) -> usize {
        self.uorfs().count()
    }

    /// Checks the coordinate invariants of the record.
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::InvalidRecord`] when the expression is
    /// negative or not finite, the CDS is inverted, or any interval reaches
    /// past the transcript end or is not strictly increasing.
    pub fn validate(&self) -> Result<(), TisFeatError> {
        let invalid = |message: String| TisFeatError::InvalidRecord {
            transcript: self.transcript_id.clone(),
            message,
        };

        if !self.expression.is_finite() || self.expression < 0.0 {
            return Err(invalid(format!(
                "expression must be a non-negative number, got {}",
                self.expression
            )));
        }
        let length = self.length();
        if self.cds.end < self.cds.start {
            return Err(invalid(format!("CDS end precedes CDS start ({})", self.cds)));
        }
        if self.cds.end > length {
            return Err(invalid(format!(
                "CDS {} extends past transcript length {}",
                self.cds, length
            )));
        }
        for orf in &self.orfs {
            if orf.start >= orf.end {
                return Err(invalid(format!("ORF {orf} is empty or inverted")));
            }
            if orf.end > length {
                return Err(invalid(format!(
                    "ORF {orf} extends past transcript length {length}"
                )));
            }
        }
        Ok(())
    }
}

/// Error types raised while training or extracting features
#[derive(Error, Debug)]
pub enum TisFeatError {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// Delimited table could not be read or written
    #[error("Table error: {0}")]
    TableError(#[from] csv::Error),
    /// JSON output could not be encoded or decoded
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    /// Malformed value in an input table
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },
    /// Input row violates the annotation contract
    #[error("Invalid record {transcript}: {message}")]
    InvalidRecord { transcript: String, message: String },
    /// Transcript identifier seen twice in one table
    #[error("Duplicate transcript identifier: {0}")]
    DuplicateTranscript(String),
    /// Sequence store has no entry for the identifier
    #[error("Sequence not found: {0}")]
    SequenceNotFound(String),
    /// Sequence store could not be opened or read
    #[error("Sequence store error: {0}")]
    SequenceStore(String),
    /// Reference sequence disagrees with the read profile length
    #[error("Length mismatch for {transcript}: read profile {profile} nt, sequence {sequence} nt")]
    LengthMismatch {
        transcript: String,
        profile: usize,
        sequence: usize,
    },
    /// Window handed to a scoring matrix of a different width
    #[error("Window width {actual} does not match matrix width {expected}")]
    WindowWidthMismatch { expected: usize, actual: usize },
    /// Window contains a symbol outside A, C, G, T
    #[error("Invalid nucleotide '{nucleotide}' at window position {position}")]
    InvalidNucleotide { nucleotide: char, position: usize },
    /// Secondary-structure prediction failed
    #[error("Structure prediction failed: {0}")]
    StructurePrediction(String),
    /// Persisted matrix table is malformed
    #[error("Invalid matrix table: {0}")]
    InvalidMatrix(String),
    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Run stopped through the stop flag before completion
    #[error("Interrupted: {0}")]
    Interrupted(String),
    /// Failure attributed to a single transcript
    #[error("Transcript {id}: {source}")]
    Transcript {
        id: String,
        #[source]
        source: Box<TisFeatError>,
    },
}

impl TisFeatError {
    /// Attach a transcript identifier to an error raised while processing it
    #[must_use]
    pub fn for_transcript(self, id: &str) -> Self {
        match self {
            already @ Self::Transcript { .. } => already,
            other => Self::Transcript {
                id: id.to_string(),
                source: Box::new(other),
            },
        }
    }
}
