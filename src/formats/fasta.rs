use crate::{Error, Result};
use noodles::fasta::fai;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Layout of one sequence inside a line-wrapped FASTA file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaiEntry {
    pub name: String,
    /// residue count, line terminators excluded
    pub length: u64,
    /// byte offset of the first residue
    pub offset: u64,
    /// residues per full line
    pub line_bases: u64,
    /// bytes per full line, terminator included
    pub line_bytes: u64,
}

impl FaiEntry {
    pub fn terminator_width(&self) -> u64 {
        self.line_bytes - self.line_bases
    }

    /// File offset of the residue at 0-based position `pos`
    pub fn byte_offset(&self, pos: u64) -> u64 {
        if self.line_bases == 0 {
            return self.offset;
        }
        self.offset + (pos / self.line_bases) * self.line_bytes + pos % self.line_bases
    }
}

impl From<&fai::Record> for FaiEntry {
    fn from(record: &fai::Record) -> Self {
        Self {
            name: String::from_utf8_lossy(record.name()).into_owned(),
            length: record.length(),
            offset: record.offset(),
            line_bases: record.line_bases(),
            line_bytes: record.line_width(),
        }
    }
}

impl From<&FaiEntry> for fai::Record {
    fn from(entry: &FaiEntry) -> Self {
        fai::Record::new(
            entry.name.clone(),
            entry.length,
            entry.offset,
            entry.line_bases,
            entry.line_bytes,
        )
    }
}

/// Name-keyed table of [`FaiEntry`] values, in file order.
///
/// Built once, by a full scan or from a `.fai` file, and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FastaIndex {
    entries: Vec<FaiEntry>,
    by_name: HashMap<String, usize>,
}

impl FastaIndex {
    fn from_entries(entries: Vec<FaiEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::Format("no sequences found".to_string()));
        }

        let mut by_name = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if by_name.insert(entry.name.clone(), i).is_some() {
                return Err(Error::Format(format!(
                    "duplicate sequence name: {}",
                    entry.name
                )));
            }
        }

        Ok(Self { entries, by_name })
    }

    /// Index a FASTA file by scanning it once.
    pub fn build<P: AsRef<Path>>(fasta_path: P) -> Result<Self> {
        let path = fasta_path.as_ref();
        let file = File::open(path)?;
        let index = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            sequences = index.len(),
            "built FASTA index"
        );
        Ok(index)
    }

    /// Index FASTA content from any buffered reader.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut entries = Vec::new();
        let mut pending: Option<PendingEntry> = None;
        let mut line = Vec::new();
        let mut byte_offset: u64 = 0;
        let mut line_number: u64 = 0;

        loop {
            line.clear();
            let bytes_read = reader.read_until(b'\n', &mut line)?;
            if bytes_read == 0 {
                break;
            }
            line_number += 1;
            byte_offset += bytes_read as u64;

            if line.first() == Some(&b'>') {
                if let Some(entry) = pending.take() {
                    entries.push(entry.finish());
                }
                let name = header_name(&line).ok_or_else(|| {
                    Error::Format(format!("empty sequence name at line {}", line_number))
                })?;
                pending = Some(PendingEntry::new(name, byte_offset));
                continue;
            }

            match pending.as_mut() {
                Some(entry) => entry.push_line(&line, line_number)?,
                None if residues(&line).is_empty() => {}
                None => {
                    return Err(Error::Format(format!(
                        "sequence data before the first header at line {}",
                        line_number
                    )));
                }
            }
        }

        if let Some(entry) = pending.take() {
            entries.push(entry.finish());
        }

        Self::from_entries(entries)
    }

    /// Load a persisted `.fai` index.
    pub fn load<P: AsRef<Path>>(index_path: P) -> Result<Self> {
        let path = index_path.as_ref();
        let index = fai::read(path)
            .map_err(|e| Error::Format(format!("failed to read FASTA index: {}", e)))?;

        let entries: Vec<FaiEntry> = index.as_ref().iter().map(FaiEntry::from).collect();
        for entry in &entries {
            if entry.line_bytes < entry.line_bases {
                return Err(Error::Format(format!(
                    "line width smaller than line bases for {}",
                    entry.name
                )));
            }
            if entry.length > 0 && entry.line_bases == 0 {
                return Err(Error::Format(format!(
                    "zero line bases for non-empty sequence {}",
                    entry.name
                )));
            }
        }

        debug!(path = %path.display(), sequences = entries.len(), "loaded FASTA index");
        Self::from_entries(entries)
    }

    /// Persist in `.fai` layout, one line per sequence in file order.
    pub fn save<P: AsRef<Path>>(&self, index_path: P) -> Result<()> {
        let records: Vec<fai::Record> = self.entries.iter().map(fai::Record::from).collect();
        let index = fai::Index::from(records);

        let mut writer = fai::io::Writer::new(File::create(index_path.as_ref())?);
        writer.write_index(&index)?;
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&FaiEntry> {
        self.get(name)
            .ok_or_else(|| Error::NotFound(format!("sequence not found: {}", name)))
    }

    pub fn get(&self, name: &str) -> Option<&FaiEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[FaiEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sequence being accumulated during a scan
struct PendingEntry {
    name: String,
    offset: u64,
    length: u64,
    line_bases: Option<u64>,
    line_bytes: Option<u64>,
    // set once a line shorter than `line_bases` has been seen
    closed_at: Option<u64>,
}

impl PendingEntry {
    fn new(name: String, offset: u64) -> Self {
        Self {
            name,
            offset,
            length: 0,
            line_bases: None,
            line_bytes: None,
            closed_at: None,
        }
    }

    fn push_line(&mut self, line: &[u8], line_number: u64) -> Result<()> {
        let bases = residues(line).len() as u64;
        let width = line.len() as u64;
        let terminated = line.last() == Some(&b'\n');

        if bases == 0 {
            self.closed_at.get_or_insert(line_number);
            return Ok(());
        }

        if let Some(short_line) = self.closed_at {
            return Err(Error::Format(format!(
                "irregular line width in {}: line {} is shorter than the lines after it",
                self.name, short_line
            )));
        }

        match (self.line_bases, self.line_bytes) {
            (Some(line_bases), Some(line_bytes)) => {
                if bases > line_bases {
                    return Err(Error::Format(format!(
                        "irregular line width in {} at line {}: {} residues, expected {}",
                        self.name, line_number, bases, line_bases
                    )));
                }
                if terminated && width - bases != line_bytes - line_bases {
                    return Err(Error::Format(format!(
                        "mixed line terminators in {} at line {}",
                        self.name, line_number
                    )));
                }
                if bases < line_bases {
                    self.closed_at = Some(line_number);
                }
            }
            _ => {
                self.line_bases = Some(bases);
                self.line_bytes = Some(width);
            }
        }

        self.length += bases;
        Ok(())
    }

    fn finish(self) -> FaiEntry {
        FaiEntry {
            name: self.name,
            length: self.length,
            offset: self.offset,
            line_bases: self.line_bases.unwrap_or(0),
            line_bytes: self.line_bytes.unwrap_or(0),
        }
    }
}

/// Line content without its `\n` or `\r\n` terminator
fn residues(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// First whitespace-delimited token after the `>` marker
fn header_name(line: &[u8]) -> Option<String> {
    let header = String::from_utf8_lossy(residues(&line[1..])).into_owned();
    header.split_whitespace().next().map(str::to_string)
}
