//! Secondary-structure free energy prediction.
//!
//! Feature extraction only needs the ensemble free energy of a window. The
//! [`StructurePredictor`] trait is the seam; [`RnaFold`] drives the ViennaRNA
//! `RNAfold` binary in partition-function mode.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use log::debug;

use crate::types::TisFeatError;

/// Predicts the ensemble free energy (kcal/mol) of nucleotide windows
pub trait StructurePredictor: Send + Sync {
    /// Ensemble free energy of one window.
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::StructurePrediction`] when the predictor fails.
    fn ensemble_free_energy(&self, sequence: &[u8]) -> Result<f64, TisFeatError>;

    /// Energies of several windows, in input order.
    ///
    /// The default folds one window at a time; implementations with a
    /// per-call start-up cost should override it.
    fn ensemble_free_energies(&self, sequences: &[Vec<u8>]) -> Result<Vec<f64>, TisFeatError> {
        sequences
            .iter()
            .map(|sequence| self.ensemble_free_energy(sequence))
            .collect()
    }
}

/// `RNAfold -p --noPS --noDP` run as a child process.
///
/// All windows of one call are streamed through a single process, one
/// sequence per line.
#[derive(Debug, Clone)]
pub struct RnaFold {
    /// Executable to run
    pub binary: PathBuf,
    /// Folding temperature in °C passed as `-T`; `None` keeps the default
    pub temperature: Option<f64>,
}

impl Default for RnaFold {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("RNAfold"),
            temperature: None,
        }
    }
}

impl RnaFold {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            temperature: None,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-p").arg("--noPS").arg("--noDP");
        if let Some(temperature) = self.temperature {
            cmd.arg("-T").arg(temperature.to_string());
        }
        cmd
    }

    fn run(&self, sequences: &[Vec<u8>]) -> Result<String, TisFeatError> {
        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TisFeatError::StructurePrediction(format!(
                    "cannot start {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            TisFeatError::StructurePrediction("RNAfold stdin unavailable".to_string())
        })?;

        // stdin is written from a second thread while stdout is drained here
        let output = thread::scope(|scope| {
            let feeder = scope.spawn(move || -> std::io::Result<()> {
                let mut stdin = stdin;
                for sequence in sequences {
                    stdin.write_all(sequence)?;
                    stdin.write_all(b"\n")?;
                }
                stdin.flush()
            });
            let output = child.wait_with_output();
            let fed = feeder.join().unwrap_or_else(|_| {
                Err(std::io::Error::other("RNAfold input thread panicked"))
            });
            fed.and(output)
        })
        .map_err(|e| TisFeatError::StructurePrediction(format!("RNAfold I/O failed: {e}")))?;

        if !output.status.success() {
            return Err(TisFeatError::StructurePrediction(format!(
                "RNAfold exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl StructurePredictor for RnaFold {
    fn ensemble_free_energy(&self, sequence: &[u8]) -> Result<f64, TisFeatError> {
        let energies = self.ensemble_free_energies(std::slice::from_ref(&sequence.to_vec()))?;
        energies.into_iter().next().ok_or_else(|| {
            TisFeatError::StructurePrediction("RNAfold returned no energy".to_string())
        })
    }

    fn ensemble_free_energies(&self, sequences: &[Vec<u8>]) -> Result<Vec<f64>, TisFeatError> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }
        let stdout = self.run(sequences)?;
        let energies = parse_ensemble_energies(&stdout)?;
        if energies.len() != sequences.len() {
            return Err(TisFeatError::StructurePrediction(format!(
                "RNAfold returned {} energies for {} sequences",
                energies.len(),
                sequences.len()
            )));
        }
        debug!("folded {} windows", sequences.len());
        Ok(energies)
    }
}

/// Extract the ensemble free energies from `RNAfold -p` output.
///
/// The ensemble line ends with the energy in square brackets, e.g.
/// `.{{...}}. [ -3.21]`; one such line is printed per input sequence.
pub fn parse_ensemble_energies(output: &str) -> Result<Vec<f64>, TisFeatError> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| line.ends_with(']'))
        .map(|line| {
            let open = line.rfind('[').ok_or_else(|| {
                TisFeatError::StructurePrediction(format!("malformed ensemble line '{line}'"))
            })?;
            let value = line[open + 1..line.len() - 1].trim();
            value.parse::<f64>().map_err(|_| {
                TisFeatError::StructurePrediction(format!("cannot parse energy '{value}'"))
            })
        })
        .collect()
}
