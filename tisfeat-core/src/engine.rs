use std::collections::HashSet;
use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::config::FeatureConfig;
use crate::features::{TranscriptFeatures, check_sequence_length, extract_features};
use crate::output::FeatureTableWriter;
use crate::results::{ExtractionSummary, TrainingSummary};
use crate::sequence::SequenceStore;
use crate::structure::StructurePredictor;
use crate::training::{
    MotifCounts, MotifModel, TrainedMotifs, TrainingContribution, accumulate,
    training_contribution,
};
use crate::types::{TisFeatError, TranscriptRecord};

/// Marker trait for pipeline training state.
///
/// Used in the type-state pattern so that feature extraction cannot run
/// before a motif model exists. Implemented by [`Untrained`] and
/// [`Trained`].
pub trait TrainingState {}

/// Marker type of a pipeline without a motif model.
///
/// A [`Pipeline<Untrained>`] can train but cannot extract features.
#[derive(Debug, Clone)]
pub struct Untrained;

/// Marker type of a pipeline holding a motif model.
///
/// A [`Pipeline<Trained>`] extracts features; its model comes from a
/// training pass or from disk.
#[derive(Debug, Clone)]
pub struct Trained;

impl TrainingState for Untrained {}
impl TrainingState for Trained {}

/// Two-pass feature pipeline.
///
/// The `S` parameter tracks whether a motif model is available; training
/// turns a [`Pipeline<Untrained>`] into a [`Pipeline<Trained>`].
///
/// # Examples
///
/// ```rust,no_run
/// use tisfeat_core::annotation::read_annotation_file;
/// use tisfeat_core::config::FeatureConfig;
/// use tisfeat_core::engine::UntrainedPipeline;
/// use tisfeat_core::output::FeatureTableWriter;
/// use tisfeat_core::sequence::IndexedFastaStore;
/// use tisfeat_core::structure::RnaFold;
/// use std::collections::HashSet;
/// use std::fs::File;
///
/// let records = read_annotation_file("annotation.tsv")?;
/// let mut store = IndexedFastaStore::open("transcripts.fa")?;
///
/// let pipeline = UntrainedPipeline::with_config(FeatureConfig::default())?;
/// let (trained, summary) = pipeline.train(&records, &mut store)?;
/// trained.save_model("model/")?;
///
/// let config = &trained.config;
/// let mut table = FeatureTableWriter::new(File::create("features.tsv")?, config.output_format, false)?;
/// let rnafold = RnaFold::default();
/// trained.extract(&records, &mut store, Some(&rnafold), &mut table, &HashSet::new())?;
/// # Ok::<(), tisfeat_core::types::TisFeatError>(())
/// ```
#[derive(Debug)]
pub struct Pipeline<S: TrainingState> {
    /// Parameters of both passes
    pub config: FeatureConfig,
    /// Counts and model of the training pass that produced this pipeline
    training: Option<TrainedMotifs>,
    /// Scoring matrices used for extraction
    model: Option<MotifModel>,
    /// Checked between chunks; set it to stop a run early
    stop: Arc<AtomicBool>,
    /// Type-state marker (zero-sized)
    _state: PhantomData<S>,
}

/// A pipeline that still has to be trained
pub type UntrainedPipeline = Pipeline<Untrained>;

/// A pipeline ready for feature extraction
pub type TrainedPipeline = Pipeline<Trained>;

impl Default for UntrainedPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TrainingState> Pipeline<S> {
    /// Handle to the stop flag shared with this pipeline.
    ///
    /// Setting it makes the running pass return after the current chunk.
    /// Rows of finished chunks are already flushed, so an interrupted
    /// extraction can be resumed.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Run `operation` up to `predictor_retries + 1` times
    fn with_retries<T>(
        &self,
        transcript_id: &str,
        mut operation: impl FnMut() -> Result<T, TisFeatError>,
    ) -> Result<(T, usize), TisFeatError> {
        let attempts = self.config.predictor_retries + 1;
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok((value, attempt)),
                Err(e) if attempt < attempts => {
                    warn!(
                        "{transcript_id}: attempt {attempt}/{attempts} failed: {e}; retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.for_transcript(transcript_id)),
            }
        }
    }

    fn fetch_chunk<T: SequenceStore + ?Sized>(
        &self,
        records: &[&TranscriptRecord],
        store: &mut T,
    ) -> Result<Vec<Vec<u8>>, TisFeatError> {
        records
            .iter()
            .map(|record| {
                self.with_retries(&record.transcript_id, || {
                    store.fetch(&record.transcript_id)
                })
                .map(|(sequence, _)| sequence)
                .inspect_err(|e| error!("{e}"))
            })
            .collect()
    }
}

impl UntrainedPipeline {
    /// Creates a pipeline with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: FeatureConfig::default(),
            training: None,
            model: None,
            stop: Arc::new(AtomicBool::new(false)),
            _state: PhantomData,
        }
    }

    /// Creates a pipeline with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::InvalidConfig`] for an invalid configuration
    /// or when the thread pool cannot be configured.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tisfeat_core::config::FeatureConfig;
    /// use tisfeat_core::engine::UntrainedPipeline;
    ///
    /// let config = FeatureConfig {
    ///     end_trim: 10,
    ///     min_utr5_length: 30,
    ///     ..Default::default()
    /// };
    /// let pipeline = UntrainedPipeline::with_config(config)?;
    /// # Ok::<(), tisfeat_core::types::TisFeatError>(())
    /// ```
    pub fn with_config(config: FeatureConfig) -> Result<Self, TisFeatError> {
        config.validate()?;
        let pipeline = Self {
            config,
            ..Self::new()
        };

        if let Some(num_threads) = pipeline.config.num_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    TisFeatError::InvalidConfig(format!("Failed to configure thread pool: {e}"))
                })?;
        }

        Ok(pipeline)
    }

    /// Build the motif model from the training subset of `records`.
    ///
    /// Sequences are fetched serially, windows are extracted in parallel and
    /// counts are accumulated in input order, so the matrices are identical
    /// for every thread count.
    ///
    /// # Errors
    ///
    /// Fails on the first sequence lookup that keeps failing, on a
    /// sequence/profile length mismatch, on an invalid record and returns
    /// [`TisFeatError::Interrupted`] when the stop flag is set.
    pub fn train<T: SequenceStore + ?Sized>(
        self,
        records: &[TranscriptRecord],
        store: &mut T,
    ) -> Result<(TrainedPipeline, TrainingSummary), TisFeatError> {
        let width = self.config.motif_flanks.width();
        let mut counts = MotifCounts::new(width);
        let mut invalid_windows = 0usize;

        info!(
            "training on {} transcripts (motif window {}+{})",
            records.len(),
            self.config.motif_flanks.left,
            self.config.motif_flanks.right
        );

        for (index, chunk) in records.chunks(self.config.chunk_size).enumerate() {
            if self.stop_requested() {
                return Err(TisFeatError::Interrupted(format!(
                    "training stopped after {index} of {} chunks",
                    records.len().div_ceil(self.config.chunk_size)
                )));
            }
            let chunk: Vec<&TranscriptRecord> = chunk.iter().collect();
            let sequences = self.fetch_chunk(&chunk, store)?;

            let contributions = chunk
                .par_iter()
                .zip(sequences.par_iter())
                .map(|(record, sequence)| {
                    record.validate()?;
                    check_sequence_length(record, sequence)
                        .map_err(|e| e.for_transcript(&record.transcript_id))?;
                    Ok(training_contribution(record, sequence, &self.config))
                })
                .collect::<Result<Vec<_>, TisFeatError>>()?;

            for contribution in &contributions {
                if matches!(contribution, TrainingContribution::InvalidWindow(_)) {
                    invalid_windows += 1;
                }
                accumulate(&mut counts, contribution)?;
            }
            debug!(
                "training chunk {}: {} transcripts",
                index + 1,
                contributions.len()
            );
        }

        let motifs = TrainedMotifs::from_counts(counts, self.config.degenerate_score);
        let summary = TrainingSummary {
            records: records.len(),
            cds_examples: motifs.counts.cds_examples,
            uorf_examples: motifs.counts.uorf_examples,
            invalid_windows,
            background: motifs.background,
        };
        info!("training done: {summary}");
        if motifs.counts.cds_examples == 0 {
            warn!("no transcript passed the CDS training gates; scores fall back to the degenerate value");
        }

        let trained = TrainedPipeline {
            config: self.config,
            model: Some(motifs.model.clone()),
            training: Some(motifs),
            stop: self.stop,
            _state: PhantomData,
        };
        Ok((trained, summary))
    }
}

impl TrainedPipeline {
    /// Creates a trained pipeline from a previously built model.
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::InvalidConfig`] when the model width differs
    /// from the configured motif window.
    pub fn new(config: FeatureConfig, model: MotifModel) -> Result<Self, TisFeatError> {
        config.validate()?;
        if model.width() != config.motif_flanks.width() {
            return Err(TisFeatError::InvalidConfig(format!(
                "model was trained for a {}-nt motif window, configuration asks for {}",
                model.width(),
                config.motif_flanks.width()
            )));
        }
        Ok(Self {
            config,
            training: None,
            model: Some(model),
            stop: Arc::new(AtomicBool::new(false)),
            _state: PhantomData,
        })
    }

    /// Creates a trained pipeline from scoring matrices saved in `dir`
    pub fn load<P: AsRef<Path>>(config: FeatureConfig, dir: P) -> Result<Self, TisFeatError> {
        let dir = dir.as_ref();
        let model = MotifModel::load(dir)?;
        info!("loaded {}-nt motif model from {}", model.width(), dir.display());
        Self::new(config, model)
    }

    /// The scoring matrices used for extraction
    pub fn model(&self) -> Result<&MotifModel, TisFeatError> {
        self.model
            .as_ref()
            .ok_or_else(|| TisFeatError::InvalidConfig("pipeline is not trained".to_string()))
    }

    /// Counts and background of the training pass, `None` for loaded models
    #[must_use]
    pub fn training(&self) -> Option<&TrainedMotifs> {
        self.training.as_ref()
    }

    /// Persist the model: count tables and scoring matrices after training,
    /// scoring matrices only for a loaded model
    pub fn save_model<P: AsRef<Path>>(&self, dir: P) -> Result<(), TisFeatError> {
        match &self.training {
            Some(training) => training.save(dir),
            None => self.model()?.save(dir),
        }
    }

    /// Feature row of one transcript, `None` when it is filtered
    pub fn extract_one(
        &self,
        record: &TranscriptRecord,
        sequence: &[u8],
        predictor: Option<&dyn StructurePredictor>,
    ) -> Result<Option<TranscriptFeatures>, TisFeatError> {
        extract_features(record, sequence, self.model()?, &self.config, predictor)
    }

    /// Run the extraction pass and write one row per transcript.
    ///
    /// Records whose ID is in `skip` (rows of a resumed table) are not
    /// processed. Rows are written in input order and flushed after every
    /// chunk. A set stop flag ends the run after the current chunk with
    /// [`ExtractionSummary::interrupted`] set.
    ///
    /// # Errors
    ///
    /// A transcript that still fails after `predictor_retries` extra
    /// attempts aborts the run with its ID attached; rows of earlier chunks
    /// stay on disk.
    pub fn extract<T, W>(
        &self,
        records: &[TranscriptRecord],
        store: &mut T,
        predictor: Option<&dyn StructurePredictor>,
        table: &mut FeatureTableWriter<W>,
        skip: &HashSet<String>,
    ) -> Result<ExtractionSummary, TisFeatError>
    where
        T: SequenceStore + ?Sized,
        W: Write,
    {
        let model = self.model()?;
        let mut summary = ExtractionSummary {
            records: records.len(),
            ..Default::default()
        };
        let structure_predicted = predictor.is_some();
        info!(
            "extracting features for {} transcripts{}",
            records.len(),
            if structure_predicted {
                ""
            } else {
                " without structure prediction"
            }
        );

        for chunk in records.chunks(self.config.chunk_size) {
            if self.stop_requested() {
                warn!("stop requested; ending extraction early");
                summary.interrupted = true;
                break;
            }

            let pending: Vec<&TranscriptRecord> = chunk
                .iter()
                .filter(|record| !skip.contains(&record.transcript_id))
                .collect();
            summary.already_done += chunk.len() - pending.len();
            let sequences = self.fetch_chunk(&pending, store)?;

            let outcomes: Vec<Result<(Option<TranscriptFeatures>, usize), TisFeatError>> = pending
                .par_iter()
                .zip(sequences.par_iter())
                .map(|(record, sequence)| {
                    self.with_retries(&record.transcript_id, || {
                        extract_features(record, sequence, model, &self.config, predictor)
                    })
                })
                .collect();

            for outcome in outcomes {
                let (features, attempts) = outcome.inspect_err(|e| error!("{e}"))?;
                if attempts > 1 {
                    summary.retried += 1;
                }
                match features {
                    Some(features) => {
                        summary.invalid_windows += features
                            .orfs
                            .iter()
                            .chain(std::iter::once(&features.cds))
                            .map(|orf| orf.invalid_windows(structure_predicted))
                            .sum::<usize>();
                        table.write(&features)?;
                        summary.rows_written += 1;
                    }
                    None => summary.ambiguous += 1,
                }
            }
            table.flush()?;
            info!(
                "{}/{} transcripts processed",
                summary.already_done + summary.rows_written + summary.ambiguous,
                records.len()
            );
        }

        if summary.already_done > 0 {
            info!("{} transcripts were already in the output", summary.already_done);
        }
        info!("extraction done: {summary}");
        Ok(summary)
    }
}
