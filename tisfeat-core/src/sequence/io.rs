use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use bio::io::fasta;
use log::{debug, info};

use crate::sequence::normalize_sequence;
use crate::types::TisFeatError;

/// Lookup of full transcript sequences by transcript identifier.
///
/// Returned sequences are uppercase with uracil written as thymine.
pub trait SequenceStore {
    /// Fetch the complete sequence of one transcript.
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::SequenceNotFound`] for unknown identifiers and
    /// [`TisFeatError::SequenceStore`] or [`TisFeatError::IoError`] when the
    /// backing storage cannot be read.
    fn fetch(&mut self, transcript_id: &str) -> Result<Vec<u8>, TisFeatError>;

    /// Whether the store holds a sequence for the identifier
    fn contains(&self, transcript_id: &str) -> bool;
}

/// Sequence store held entirely in memory.
///
/// Meant for tests and small references; use [`IndexedFastaStore`] for a
/// transcriptome.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    sequences: HashMap<String, Vec<u8>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the sequence of a transcript
    pub fn insert(&mut self, transcript_id: impl Into<String>, sequence: impl Into<Vec<u8>>) {
        let mut sequence = sequence.into();
        normalize_sequence(&mut sequence);
        self.sequences.insert(transcript_id.into(), sequence);
    }

    /// Load every record of a FASTA file using rust-bio
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::IoError`] when the file cannot be opened and
    /// [`TisFeatError::SequenceStore`] for malformed records.
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self, TisFeatError> {
        let file = File::open(path.as_ref())?;
        let reader = fasta::Reader::new(file);
        let mut store = Self::new();
        for result in reader.records() {
            let record = result.map_err(|e| TisFeatError::SequenceStore(e.to_string()))?;
            store.insert(record.id(), record.seq().to_vec());
        }
        Ok(store)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl<K: Into<String>, V: Into<Vec<u8>>> FromIterator<(K, V)> for InMemoryStore {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut store = Self::new();
        for (id, sequence) in iter {
            store.insert(id, sequence);
        }
        store
    }
}

impl SequenceStore for InMemoryStore {
    fn fetch(&mut self, transcript_id: &str) -> Result<Vec<u8>, TisFeatError> {
        self.sequences
            .get(transcript_id)
            .cloned()
            .ok_or_else(|| TisFeatError::SequenceNotFound(transcript_id.to_string()))
    }

    fn contains(&self, transcript_id: &str) -> bool {
        self.sequences.contains_key(transcript_id)
    }
}

/// Random-access FASTA store backed by a `.fai` index.
///
/// Only the requested record is read from disk on every lookup. A missing
/// index is generated next to the FASTA on open.
pub struct IndexedFastaStore {
    reader: fasta::IndexedReader<File>,
    names: HashSet<String>,
    path: PathBuf,
}

impl IndexedFastaStore {
    /// Open a FASTA file, indexing it first if no `.fai` exists.
    ///
    /// # Errors
    ///
    /// Returns [`TisFeatError::SequenceStore`] if the FASTA or its index
    /// cannot be opened, and the errors of [`build_fasta_index`] when an
    /// index has to be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TisFeatError> {
        let path = path.as_ref();
        let index_path = fai_path(path);
        if !index_path.exists() {
            info!(
                "no index found for {}; writing {}",
                path.display(),
                index_path.display()
            );
            build_fasta_index(path)?;
        }

        let reader = fasta::IndexedReader::from_file(&path).map_err(|e| {
            TisFeatError::SequenceStore(format!("cannot open {}: {}", path.display(), e))
        })?;
        let names: HashSet<String> = reader
            .index
            .sequences()
            .into_iter()
            .map(|sequence| sequence.name)
            .collect();
        debug!("indexed {} sequences in {}", names.len(), path.display());

        Ok(Self {
            reader,
            names,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl SequenceStore for IndexedFastaStore {
    fn fetch(&mut self, transcript_id: &str) -> Result<Vec<u8>, TisFeatError> {
        if !self.names.contains(transcript_id) {
            return Err(TisFeatError::SequenceNotFound(transcript_id.to_string()));
        }
        self.reader.fetch_all(transcript_id)?;
        let mut sequence = Vec::new();
        self.reader.read(&mut sequence)?;
        normalize_sequence(&mut sequence);
        Ok(sequence)
    }

    fn contains(&self, transcript_id: &str) -> bool {
        self.names.contains(transcript_id)
    }
}

/// Path of the samtools-style index belonging to a FASTA file
#[must_use]
pub fn fai_path(fasta_path: &Path) -> PathBuf {
    let mut raw: OsString = fasta_path.as_os_str().to_owned();
    raw.push(".fai");
    PathBuf::from(raw)
}

#[derive(Debug)]
struct FaiEntry {
    name: String,
    length: u64,
    offset: u64,
    line_bases: u64,
    line_width: u64,
}

/// Write a samtools-compatible `.fai` index next to a FASTA file.
///
/// Every record must use a constant line width, with only its last line
/// allowed to be shorter.
///
/// # Errors
///
/// Returns [`TisFeatError::ParseError`] for sequence data before the first
/// header, ragged line widths, or duplicate record names.
pub fn build_fasta_index<P: AsRef<Path>>(path: P) -> Result<PathBuf, TisFeatError> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let mut entries: Vec<FaiEntry> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current: Option<FaiEntry> = None;
    let mut short_line_seen = false;
    let mut offset = 0u64;
    let mut line_no = 0usize;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let width = read as u64;
        let bases = line
            .iter()
            .rposition(|&b| b != b'\n' && b != b'\r')
            .map_or(0, |last| last + 1) as u64;

        if line.first() == Some(&b'>') {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            let header = String::from_utf8_lossy(&line[1..bases as usize]);
            let name = header.split_whitespace().next().unwrap_or("").to_string();
            if !seen.insert(name.clone()) {
                return Err(TisFeatError::ParseError {
                    line: line_no,
                    message: format!("duplicate FASTA record '{name}'"),
                });
            }
            current = Some(FaiEntry {
                name,
                length: 0,
                offset: offset + width,
                line_bases: 0,
                line_width: 0,
            });
            short_line_seen = false;
        } else if let Some(entry) = current.as_mut() {
            if bases == 0 {
                short_line_seen = true;
            } else {
                if short_line_seen {
                    return Err(TisFeatError::ParseError {
                        line: line_no,
                        message: format!("ragged line width in record '{}'", entry.name),
                    });
                }
                if entry.line_bases == 0 {
                    entry.line_bases = bases;
                    entry.line_width = width;
                } else if bases > entry.line_bases {
                    return Err(TisFeatError::ParseError {
                        line: line_no,
                        message: format!("ragged line width in record '{}'", entry.name),
                    });
                } else if bases < entry.line_bases {
                    short_line_seen = true;
                }
                entry.length += bases;
            }
        } else if bases > 0 {
            return Err(TisFeatError::ParseError {
                line: line_no,
                message: "sequence data before the first FASTA header".to_string(),
            });
        }
        offset += width;
    }
    if let Some(entry) = current.take() {
        entries.push(entry);
    }

    let index_path = fai_path(path);
    let mut writer = BufWriter::new(File::create(&index_path)?);
    for entry in &entries {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            entry.name, entry.length, entry.offset, entry.line_bases, entry.line_width
        )?;
    }
    writer.flush()?;
    Ok(index_path)
}
