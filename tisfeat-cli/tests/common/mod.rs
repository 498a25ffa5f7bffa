#![allow(dead_code)]

use assert_cmd::Command;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const TRANSCRIPTS: usize = 8;
pub const TRANSCRIPT_LENGTH: usize = 60;

/// Inputs of one CLI run, kept alive by the temporary directory
pub struct Fixture {
    pub dir: TempDir,
    pub annotation: PathBuf,
    pub sequences: PathBuf,
    pub model_dir: PathBuf,
}

impl Fixture {
    pub fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn sequence(seed: usize) -> String {
    const BASES: [char; 4] = ['A', 'C', 'G', 'T'];
    (0..TRANSCRIPT_LENGTH)
        .map(|i| BASES[(i * 7 + seed * 3 + i / 5) % 4])
        .collect()
}

/// Eight transcripts: even ones train the CDS matrices, odd ones carry a
/// single uORF upstream of the CDS.
pub fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let annotation = dir.path().join("annotation.tsv");
    let sequences = dir.path().join("transcripts.fa");

    let mut table = String::from(
        "Transcript\tGene\tGene_Name\tGene_Expression_FPKM\tRPF_csvProfile\tCDS\tORF_starts\tORF_ends\n",
    );
    let mut fasta = String::new();
    for i in 0..TRANSCRIPTS {
        let profile: Vec<String> = (0..TRANSCRIPT_LENGTH).map(|p| (p % 3).to_string()).collect();
        let (starts, ends) = if i % 2 == 0 {
            ("20", "50")
        } else {
            ("[8, 20]", "[17, 50]")
        };
        table.push_str(&format!(
            "tx{i}\tg{i}\tGENE{i}\t{}\t{}\t20,50\t{starts}\t{ends}\n",
            1.5 + i as f64,
            profile.join(",")
        ));
        fasta.push_str(&format!(">tx{i}\n{}\n", sequence(i)));
    }
    fs::write(&annotation, table).unwrap();
    fs::write(&sequences, fasta).unwrap();

    let model_dir = dir.path().join("model");
    Fixture {
        dir,
        annotation,
        sequences,
        model_dir,
    }
}

/// Thresholds sized for the short fixture transcripts
pub const SMALL_CONFIG: &[&str] = &[
    "--min-utr5-length",
    "10",
    "--motif-flanks",
    "4",
    "3",
    "--upstream-structure-flanks",
    "6",
    "3",
    "--downstream-structure-flanks",
    "3",
    "6",
    "--end-trim",
    "3",
    "--min-uorf-length",
    "5",
    "--min-uorf-distance",
    "4",
    "--chunk-size",
    "3",
];

/// The tisfeat binary with the inputs of `fixture` and the small config
pub fn tisfeat(subcommand: &str, fixture: &Fixture) -> Command {
    let mut cmd = Command::cargo_bin("tisfeat").unwrap();
    cmd.arg(subcommand)
        .arg("-a")
        .arg(&fixture.annotation)
        .arg("-s")
        .arg(&fixture.sequences)
        .arg("-m")
        .arg(&fixture.model_dir)
        .args(SMALL_CONFIG)
        .arg("--quiet");
    cmd
}

/// Run both passes without structure prediction into `output`
pub fn run_without_structure(fixture: &Fixture, output: &Path, extra: &[&str]) {
    tisfeat("run", fixture)
        .arg("-o")
        .arg(output)
        .arg("--no-structure")
        .args(extra)
        .assert()
        .success();
}

pub fn sha256_file(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fs::read(path).unwrap());
    format!("{:x}", hasher.finalize())
}
