// =============================================================================
// Alphabet
// =============================================================================

/// Version string for tisfeat
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Real nucleotides in matrix row order
pub const NUCLEOTIDES: [u8; 4] = [b'A', b'T', b'C', b'G'];

/// Number of real nucleotides scored by a matrix
pub const NUM_BASES: usize = 4;

/// Ambiguous base symbol
pub const AMBIGUOUS_BASE: u8 = b'N';

/// Rows tracked while counting: the real bases plus the ambiguous base
pub const NUM_COUNT_ROWS: usize = NUM_BASES + 1;

/// Row of the ambiguous base inside a count matrix
pub const AMBIGUOUS_ROW: usize = NUM_BASES;

/// Length of a codon in base pairs
pub const CODON_LENGTH: usize = 3;

// =============================================================================
// Default parameters
// =============================================================================

/// Minimum 5'UTR length for a transcript to enter CDS-context training
pub const DEFAULT_MIN_UTR5_LENGTH: usize = 50;

/// Minimum expression (FPKM) for a transcript to enter CDS-context training
pub const DEFAULT_MIN_EXPRESSION: f64 = 1.0;

/// Nucleotides upstream of the start codon in the motif window
pub const DEFAULT_MOTIF_LEFT_FLANK: usize = 10;

/// Nucleotides downstream of the start codon in the motif window
pub const DEFAULT_MOTIF_RIGHT_FLANK: usize = 5;

/// Upstream-weighted structure window around the start position
pub const DEFAULT_STRUCTURE_UPSTREAM_FLANKS: (usize, usize) = (50, 10);

/// Downstream-weighted structure window around the start position
pub const DEFAULT_STRUCTURE_DOWNSTREAM_FLANKS: (usize, usize) = (10, 50);

/// Positions removed before an ORF end when summing reads
pub const DEFAULT_END_TRIM: usize = 15;

/// Minimum uORF length for uORF-context training
pub const DEFAULT_MIN_UORF_LENGTH: usize = 9;

/// Minimum distance between transcript start and uORF start for training
pub const DEFAULT_MIN_UORF_DISTANCE: usize = 20;

/// Score substituted where a log-odds ratio is undefined
pub const DEFAULT_DEGENERATE_SCORE: f64 = 0.0;

/// Transcripts handled per parallel chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Extra attempts for a transcript whose extraction fails
pub const DEFAULT_PREDICTOR_RETRIES: usize = 1;

// =============================================================================
// Tables
// =============================================================================

/// Placeholder written for windows that could not be extracted
pub const MISSING_VALUE: &str = "NA";

/// Separator of per-ORF values inside one table cell
pub const LIST_SEPARATOR: &str = ",";

/// Header of the nucleotide column in matrix tables
pub const MATRIX_ROW_HEADER: &str = "nucleotide";

/// File names of persisted matrices inside a model directory
pub const CDS_WEIGHTED_COUNTS_FILE: &str = "pssm_cds_weighted.tsv";
pub const CDS_UNWEIGHTED_COUNTS_FILE: &str = "pssm_cds_unweighted.tsv";
pub const UORF_WEIGHTED_COUNTS_FILE: &str = "pssm_uorf_weighted.tsv";
pub const UORF_UNWEIGHTED_COUNTS_FILE: &str = "pssm_uorf_unweighted.tsv";
pub const WEIGHTED_SCORE_FILE: &str = "en_score.tsv";
pub const UNWEIGHTED_SCORE_FILE: &str = "en_unweighted_score.tsv";

/// Columns of the input annotation table
pub const COL_TRANSCRIPT: &str = "Transcript";
pub const COL_GENE: &str = "Gene";
pub const COL_GENE_NAME: &str = "Gene_Name";
pub const COL_EXPRESSION: &str = "Gene_Expression_FPKM";
pub const COL_PROFILE: &str = "RPF_csvProfile";
pub const COL_CDS: &str = "CDS";
pub const COL_ORF_STARTS: &str = "ORF_starts";
pub const COL_ORF_ENDS: &str = "ORF_ends";

/// Columns of the feature table, in output order
pub const FEATURE_COLUMNS: [&str; 39] = [
    "Transcript",
    "Gene",
    "Gene_Name",
    "Gene_Expression_FPKM",
    "UTR5_length",
    "UTR3_length",
    "CDS_length",
    "UTR5_reads",
    "UTR5_reads_trimmed",
    "UTR5_GC",
    "CDS_GC",
    "CDS_reads",
    "CDS_TE",
    "uORF_count",
    "uORF_reads",
    "uORF_union_reads",
    "uORF_union_length",
    "uORF_starts",
    "uORF_ends_to_CDS",
    "uORF_lengths",
    "uORF_context",
    "uORF_WRENT",
    "uORF_URENT",
    "uORF_EFE_upstream",
    "uORF_EFE_downstream",
    "CDS_start",
    "CDS_context",
    "CDS_WRENT",
    "CDS_URENT",
    "CDS_EFE_upstream",
    "CDS_EFE_downstream",
    "ORF_starts",
    "ORF_lengths",
    "ORF_context",
    "ORF_WRENT",
    "ORF_URENT",
    "ORF_EFE_upstream",
    "ORF_EFE_downstream",
    "ORF_types",
];
