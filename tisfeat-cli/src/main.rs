//! # tisfeat - translation-initiation feature tables
//!
//! Command-line driver for the two-pass feature pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # Train the start-context matrices
//! tisfeat train -a annotation.tsv -s transcripts.fa -m model/
//!
//! # Extract features with a saved model
//! tisfeat extract -a annotation.tsv -s transcripts.fa -m model/ -o features.tsv
//!
//! # Both passes at once
//! tisfeat run -a annotation.tsv -s transcripts.fa -m model/ -o features.tsv
//! ```
//!
//! ## Options
//!
//! - `-a, --annotation <FILE>`: annotation table (tab-separated)
//! - `-s, --sequences <FILE>`: transcript FASTA; a `.fai` index is created if missing
//! - `-m, --model-dir <DIR>`: where count and scoring matrices are written or read
//! - `-o, --output <FILE>`: feature table
//! - `-f, --format <FORMAT>`: `tsv` or `jsonl` (default: tsv)
//! - `--resume`: keep rows already in the output and append the rest
//! - `--no-structure`: skip folding, energies become `NA`
//! - `--rnafold <BIN>`: folding executable (default: RNAfold)
//! - `-t, --threads <N>`: worker threads (default: all cores)
//! - `-l, --level <LEVEL>`: log level (default: info)
//! - `-q, --quiet`: only warnings and errors

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use log::{Level, info, warn};
use simple_logger::init_with_level;
use std::collections::HashSet;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tisfeat_core::annotation::read_annotation_file;
use tisfeat_core::context::Flanks;
use tisfeat_core::engine::{TrainedPipeline, UntrainedPipeline};
use tisfeat_core::output::{FeatureTableWriter, needs_header, resume_feature_table};
use tisfeat_core::results::ExtractionSummary;
use tisfeat_core::sequence::IndexedFastaStore;
use tisfeat_core::structure::{RnaFold, StructurePredictor};
use tisfeat_core::types::TranscriptRecord;
use tisfeat_core::{FeatureConfig, OutputFormat};

fn input_args() -> [Arg; 3] {
    [
        Arg::new("annotation")
            .short('a')
            .long("annotation")
            .value_name("FILE")
            .value_parser(value_parser!(PathBuf))
            .required(true)
            .help("Annotation table (tab-separated, one row per transcript)"),
        Arg::new("sequences")
            .short('s')
            .long("sequences")
            .value_name("FILE")
            .value_parser(value_parser!(PathBuf))
            .required(true)
            .help("Transcript FASTA file"),
        Arg::new("model-dir")
            .short('m')
            .long("model-dir")
            .value_name("DIR")
            .value_parser(value_parser!(PathBuf))
            .required(true)
            .help("Directory of the count and scoring matrices"),
    ]
}

fn flank_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .num_args(2)
        .value_names(["LEFT", "RIGHT"])
        .value_parser(value_parser!(usize))
        .help(help)
}

fn config_args() -> Vec<Arg> {
    vec![
        Arg::new("min-utr5-length")
            .long("min-utr5-length")
            .value_name("NT")
            .value_parser(value_parser!(usize))
            .help("Minimum 5' UTR length of CDS training transcripts"),
        Arg::new("min-expression")
            .long("min-expression")
            .value_name("FPKM")
            .value_parser(value_parser!(f64))
            .help("Minimum expression of CDS training transcripts"),
        flank_arg("motif-flanks", "Motif window around the start codon"),
        flank_arg("upstream-structure-flanks", "Structure window ending past the start"),
        flank_arg(
            "downstream-structure-flanks",
            "Structure window starting before the start",
        ),
        Arg::new("end-trim")
            .long("end-trim")
            .value_name("NT")
            .value_parser(value_parser!(usize))
            .help("Positions dropped before an ORF end when summing reads"),
        Arg::new("min-uorf-length")
            .long("min-uorf-length")
            .value_name("NT")
            .value_parser(value_parser!(usize))
            .help("uORF training length must exceed this"),
        Arg::new("min-uorf-distance")
            .long("min-uorf-distance")
            .value_name("NT")
            .value_parser(value_parser!(usize))
            .help("uORF training start must lie beyond this"),
        Arg::new("degenerate-score")
            .long("degenerate-score")
            .value_name("SCORE")
            .value_parser(value_parser!(f64))
            .allow_hyphen_values(true)
            .help("Log-odds used where a frequency is zero (e.g. 0 or -inf)"),
        Arg::new("chunk-size")
            .long("chunk-size")
            .value_name("N")
            .value_parser(value_parser!(usize))
            .help("Transcripts per parallel chunk"),
        Arg::new("retries")
            .long("retries")
            .value_name("N")
            .value_parser(value_parser!(usize))
            .help("Extra attempts for a transcript whose folding fails"),
    ]
}

fn output_args() -> Vec<Arg> {
    vec![
        Arg::new("output")
            .short('o')
            .long("output")
            .value_name("FILE")
            .value_parser(value_parser!(PathBuf))
            .required(true)
            .help("Feature table"),
        Arg::new("format")
            .short('f')
            .long("format")
            .value_name("FORMAT")
            .value_parser(["tsv", "jsonl"])
            .default_value("tsv")
            .help("Output format: tsv or jsonl"),
        Arg::new("resume")
            .long("resume")
            .action(ArgAction::SetTrue)
            .help("Keep rows already in the output and append the rest"),
        Arg::new("no-structure")
            .long("no-structure")
            .action(ArgAction::SetTrue)
            .help("Do not fold windows; energies are written as NA"),
        Arg::new("rnafold")
            .long("rnafold")
            .value_name("BIN")
            .value_parser(value_parser!(PathBuf))
            .default_value("RNAfold")
            .help("RNAfold executable"),
        Arg::new("temperature")
            .long("temperature")
            .value_name("CELSIUS")
            .value_parser(value_parser!(f64))
            .allow_hyphen_values(true)
            .help("Folding temperature"),
    ]
}

fn cli() -> Command {
    Command::new("tisfeat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translation-initiation feature tables from ribosome profiling")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .global(true)
                .help("Worker threads (default: all cores)"),
        )
        .arg(
            Arg::new("level")
                .short('l')
                .long("level")
                .value_name("LEVEL")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("info")
                .global(true)
                .help("Log level"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Only report warnings and errors"),
        )
        .subcommand(
            Command::new("train")
                .about("Build the start-context matrices")
                .args(input_args())
                .args(config_args()),
        )
        .subcommand(
            Command::new("extract")
                .about("Write the feature table using saved matrices")
                .args(input_args())
                .args(config_args())
                .args(output_args()),
        )
        .subcommand(
            Command::new("run")
                .about("Train, save the matrices and write the feature table")
                .args(input_args())
                .args(config_args())
                .args(output_args()),
        )
}

fn flanks(matches: &ArgMatches, id: &str) -> Option<Flanks> {
    let mut values = matches.get_many::<usize>(id)?;
    match (values.next(), values.next()) {
        (Some(left), Some(right)) => Some(Flanks::new(*left, *right)),
        _ => None,
    }
}

fn build_config(matches: &ArgMatches) -> FeatureConfig {
    let mut config = FeatureConfig {
        num_threads: matches.get_one::<usize>("threads").copied(),
        ..Default::default()
    };

    if let Some(&value) = matches.get_one::<usize>("min-utr5-length") {
        config.min_utr5_length = value;
    }
    if let Some(&value) = matches.get_one::<f64>("min-expression") {
        config.min_expression = value;
    }
    if let Some(value) = flanks(matches, "motif-flanks") {
        config.motif_flanks = value;
    }
    if let Some(value) = flanks(matches, "upstream-structure-flanks") {
        config.structure_flanks_upstream = value;
    }
    if let Some(value) = flanks(matches, "downstream-structure-flanks") {
        config.structure_flanks_downstream = value;
    }
    if let Some(&value) = matches.get_one::<usize>("end-trim") {
        config.end_trim = value;
    }
    if let Some(&value) = matches.get_one::<usize>("min-uorf-length") {
        config.min_uorf_length = value;
    }
    if let Some(&value) = matches.get_one::<usize>("min-uorf-distance") {
        config.min_uorf_distance = value;
    }
    if let Some(&value) = matches.get_one::<f64>("degenerate-score") {
        config.degenerate_score = value;
    }
    if let Some(&value) = matches.get_one::<usize>("chunk-size") {
        config.chunk_size = value;
    }
    if let Some(&value) = matches.get_one::<usize>("retries") {
        config.predictor_retries = value;
    }
    // Only extract/run define --format
    if let Ok(Some(format)) = matches.try_get_one::<String>("format") {
        config.output_format = match format.as_str() {
            "jsonl" => OutputFormat::Jsonl,
            _ => OutputFormat::Tsv,
        };
    }
    config
}

fn required_path<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a Path, Box<dyn Error>> {
    matches
        .get_one::<PathBuf>(id)
        .map(PathBuf::as_path)
        .ok_or_else(|| format!("missing --{id}").into())
}

fn load_inputs(
    matches: &ArgMatches,
) -> Result<(Vec<TranscriptRecord>, IndexedFastaStore), Box<dyn Error>> {
    let records = read_annotation_file(required_path(matches, "annotation")?)?;
    let store = IndexedFastaStore::open(required_path(matches, "sequences")?)?;
    Ok((records, store))
}

/// Run the extraction pass into the `--output` table
fn write_features(
    pipeline: &TrainedPipeline,
    records: &[TranscriptRecord],
    store: &mut IndexedFastaStore,
    matches: &ArgMatches,
) -> Result<ExtractionSummary, Box<dyn Error>> {
    let output = required_path(matches, "output")?;
    let format = pipeline.config.output_format;

    let (file, skip, append) = if matches.get_flag("resume") {
        let skip = resume_feature_table(output, format)?;
        let append = !needs_header(output);
        info!(
            "resuming {}: {} transcripts already written",
            output.display(),
            skip.len()
        );
        let file = OpenOptions::new().create(true).append(true).open(output)?;
        (file, skip, append)
    } else {
        (File::create(output)?, HashSet::new(), false)
    };
    let mut table = FeatureTableWriter::new(BufWriter::new(file), format, append)?;

    let rnafold = RnaFold {
        binary: matches
            .get_one::<PathBuf>("rnafold")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("RNAfold")),
        temperature: matches.get_one::<f64>("temperature").copied(),
    };
    let predictor: Option<&dyn StructurePredictor> = if matches.get_flag("no-structure") {
        None
    } else {
        Some(&rnafold)
    };

    let summary = pipeline.extract(records, store, predictor, &mut table, &skip)?;
    if summary.interrupted {
        warn!("run interrupted; rerun with --resume to finish");
    }
    Ok(summary)
}

fn train(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let (records, mut store) = load_inputs(matches)?;
    let pipeline = UntrainedPipeline::with_config(build_config(matches))?;
    let (trained, _) = pipeline.train(&records, &mut store)?;
    let model_dir = required_path(matches, "model-dir")?;
    trained.save_model(model_dir)?;
    info!("matrices written to {}", model_dir.display());
    Ok(())
}

fn extract(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let (records, mut store) = load_inputs(matches)?;
    let config = build_config(matches);
    // Builds the thread pool; the model comes from disk
    let config = UntrainedPipeline::with_config(config)?.config;
    let trained = TrainedPipeline::load(config, required_path(matches, "model-dir")?)?;
    write_features(&trained, &records, &mut store, matches)?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let (records, mut store) = load_inputs(matches)?;
    let pipeline = UntrainedPipeline::with_config(build_config(matches))?;
    let (trained, _) = pipeline.train(&records, &mut store)?;
    let model_dir = required_path(matches, "model-dir")?;
    trained.save_model(model_dir)?;
    info!("matrices written to {}", model_dir.display());
    write_features(&trained, &records, &mut store, matches)?;
    Ok(())
}

/// Main entry point of the tisfeat CLI.
///
/// Parses the command line, sets up logging and dispatches to the
/// requested pass.
fn main() -> Result<(), Box<dyn Error>> {
    let matches = cli().get_matches();

    let level = if matches.get_flag("quiet") {
        Level::Warn
    } else {
        matches
            .get_one::<String>("level")
            .map_or(Ok(Level::Info), |level| level.parse::<Level>())
            .map_err(|e| format!("invalid log level: {e}"))?
    };
    init_with_level(level)?;

    match matches.subcommand() {
        Some(("train", sub)) => train(sub),
        Some(("extract", sub)) => extract(sub),
        Some(("run", sub)) => run(sub),
        _ => Err("no subcommand given".into()),
    }
}
