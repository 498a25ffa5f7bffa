use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::collections::HashSet;
use tisfeat_core::config::{FeatureConfig, OutputFormat};
use tisfeat_core::context::Flanks;
use tisfeat_core::engine::UntrainedPipeline;
use tisfeat_core::features::extract_features;
use tisfeat_core::output::FeatureTableWriter;
use tisfeat_core::scoring::ScoringMatrix;
use tisfeat_core::sequence::InMemoryStore;
use tisfeat_core::types::{Interval, TranscriptRecord};

mod criterion_config;
use criterion_config::configure_criterion;

const TRANSCRIPT_LENGTH: usize = 2000;

fn sequence(seed: usize) -> Vec<u8> {
    const BASES: [u8; 4] = *b"ACGT";
    (0..TRANSCRIPT_LENGTH)
        .map(|i| BASES[(i * 7 + seed * 13 + i / 11) % 4])
        .collect()
}

// Transcripts with a 200-nt 5' UTR, a CDS and a handful of ORFs around it
fn dataset(count: usize) -> (Vec<TranscriptRecord>, InMemoryStore) {
    let mut store = InMemoryStore::new();
    let records = (0..count)
        .map(|i| {
            let id = format!("tx{i}");
            store.insert(id.clone(), sequence(i));
            TranscriptRecord {
                transcript_id: id,
                gene_id: format!("g{i}"),
                gene_name: format!("GENE{i}"),
                expression: 1.0 + (i % 7) as f64,
                reads: (0..TRANSCRIPT_LENGTH as u32).map(|p| (p * 31 + i as u32) % 5).collect(),
                cds: Interval::new(200, 1700),
                orfs: match i % 3 {
                    0 => vec![Interval::new(200, 1700)],
                    1 => vec![Interval::new(60, 120), Interval::new(200, 1700)],
                    _ => vec![
                        Interval::new(30, 90),
                        Interval::new(150, 240),
                        Interval::new(200, 1700),
                        Interval::new(900, 1200),
                        Interval::new(1750, 1900),
                    ],
                },
            }
        })
        .collect();
    (records, store)
}

fn benchmark_scoring(c: &mut Criterion) {
    let matrix = ScoringMatrix::from_columns(
        (0..15)
            .map(|i| [0.1 * i as f64, -0.2, 0.3, -0.05 * i as f64])
            .collect(),
    );
    let window = &sequence(1)[..15];

    let mut group = c.benchmark_group("scoring");
    group.throughput(Throughput::Elements(1));
    group.bench_function("score_15nt_window", |b| {
        b.iter(|| matrix.score(black_box(window)))
    });
    group.finish();
}

fn benchmark_extraction(c: &mut Criterion) {
    let (records, mut store) = dataset(300);
    let (trained, _) = UntrainedPipeline::new()
        .train(&records, &mut store)
        .unwrap();
    let config = trained.config.clone();
    let model = trained.model().unwrap().clone();

    let mut group = c.benchmark_group("extraction");
    group.throughput(Throughput::Elements(1));
    let record = &records[2];
    let seq = sequence(2);
    group.bench_function("single_transcript", |b| {
        b.iter(|| extract_features(black_box(record), &seq, &model, &config, None).unwrap())
    });
    group.finish();

    let mut group = c.benchmark_group("extraction_pass");
    for count in [100, 300] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut buffer = Vec::new();
                let mut table =
                    FeatureTableWriter::new(&mut buffer, OutputFormat::Tsv, false).unwrap();
                trained
                    .extract(&records[..count], &mut store, None, &mut table, &HashSet::new())
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn benchmark_training(c: &mut Criterion) {
    let (records, mut store) = dataset(300);
    let config = FeatureConfig {
        motif_flanks: Flanks::new(10, 5),
        ..Default::default()
    };

    let mut group = c.benchmark_group("training");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("train_300_transcripts", |b| {
        b.iter(|| {
            UntrainedPipeline::with_config(config.clone())
                .unwrap()
                .train(&records, &mut store)
                .unwrap()
        })
    });
    group.finish();
}

criterion_group!(
    name = benches;
    config = configure_criterion();
    targets = benchmark_scoring, benchmark_extraction, benchmark_training
);
criterion_main!(benches);
