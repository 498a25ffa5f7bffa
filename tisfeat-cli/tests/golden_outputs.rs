mod common;

use insta::assert_snapshot;
use std::fs;

use crate::common::{TRANSCRIPTS, fixture, run_without_structure, sha256_file};

// Column layout is the contract with downstream readers
#[test]
fn feature_table_header_snapshot() {
    let fixture = fixture();
    let output = fixture.output("features.tsv");
    run_without_structure(&fixture, &output, &[]);

    let text = fs::read_to_string(&output).unwrap();
    let header = text.lines().next().unwrap().to_string();
    assert_snapshot!("feature_table_header", header);
}

#[test]
fn one_row_per_transcript_in_input_order() {
    let fixture = fixture();
    let output = fixture.output("features.tsv");
    run_without_structure(&fixture, &output, &[]);

    let text = fs::read_to_string(&output).unwrap();
    let ids: Vec<&str> = text
        .lines()
        .skip(1)
        .map(|line| line.split('\t').next().unwrap())
        .collect();
    let expected: Vec<String> = (0..TRANSCRIPTS).map(|i| format!("tx{i}")).collect();
    assert_eq!(ids, expected);

    let columns = text.lines().next().unwrap().split('\t').count();
    for line in text.lines().skip(1) {
        assert_eq!(line.split('\t').count(), columns, "ragged row: {line}");
    }
}

#[test]
fn energies_are_na_without_structure_prediction() {
    let fixture = fixture();
    let output = fixture.output("features.tsv");
    run_without_structure(&fixture, &output, &[]);

    let text = fs::read_to_string(&output).unwrap();
    let header: Vec<&str> = text.lines().next().unwrap().split('\t').collect();
    let cds_efe = header
        .iter()
        .position(|column| *column == "CDS_EFE_upstream")
        .unwrap();
    for line in text.lines().skip(1) {
        assert_eq!(line.split('\t').nth(cds_efe), Some("NA"));
    }
}

#[test]
fn output_is_identical_across_thread_counts() {
    let fixture = fixture();
    let single = fixture.output("single.tsv");
    let parallel = fixture.output("parallel.tsv");
    run_without_structure(&fixture, &single, &["--threads", "1"]);
    run_without_structure(&fixture, &parallel, &["--threads", "4"]);

    assert_eq!(sha256_file(&single), sha256_file(&parallel));
}

#[test]
fn saved_model_reproduces_training_run() {
    let fixture = fixture();
    let trained_output = fixture.output("run.tsv");
    run_without_structure(&fixture, &trained_output, &[]);

    let reloaded_output = fixture.output("extract.tsv");
    common::tisfeat("extract", &fixture)
        .arg("-o")
        .arg(&reloaded_output)
        .arg("--no-structure")
        .assert()
        .success();

    assert_eq!(sha256_file(&trained_output), sha256_file(&reloaded_output));
}
