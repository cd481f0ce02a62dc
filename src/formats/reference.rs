use super::ByteRange;
use super::fasta::{FaiEntry, FastaIndex};
use crate::region::RegionSpec;
use crate::{Error, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Conventional index location: `<fasta>.fai`
pub fn index_path_for(fasta_path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.fai", fasta_path.display()))
}

/// Random access to the sequences of an indexed FASTA file.
///
/// Holds the path and the immutable index only; every retrieval opens its
/// own handle, so a `FastaReference` can be shared across threads.
#[derive(Debug, Clone)]
pub struct FastaReference {
    path: PathBuf,
    index: FastaIndex,
}

impl FastaReference {
    /// Open a FASTA file, loading `<path>.fai` when present and otherwise
    /// indexing the file and persisting the result next to it.
    pub fn open<P: AsRef<Path>>(fasta_path: P) -> Result<Self> {
        let path = fasta_path.as_ref();
        let index_path = index_path_for(path);

        let index = if index_path.exists() {
            FastaIndex::load(&index_path)?
        } else {
            let index = FastaIndex::build(path)?;
            if let Err(e) = index.save(&index_path) {
                warn!(path = %index_path.display(), error = %e, "could not write FASTA index");
            }
            index
        };

        Ok(Self::with_index(path, index))
    }

    /// Open a FASTA file after re-indexing it, replacing any existing `.fai`.
    pub fn open_rebuilt<P: AsRef<Path>>(fasta_path: P) -> Result<Self> {
        let path = fasta_path.as_ref();
        let index = FastaIndex::build(path)?;
        index.save(index_path_for(path))?;
        Ok(Self::with_index(path, index))
    }

    pub fn with_index<P: AsRef<Path>>(fasta_path: P, index: FastaIndex) -> Self {
        Self {
            path: fasta_path.as_ref().to_path_buf(),
            index,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> &FastaIndex {
        &self.index
    }

    /// Whole sequence by name
    pub fn get_sequence(&self, name: &str) -> Result<String> {
        let entry = self.index.lookup(name)?;
        self.read_residues(entry, 0, entry.length)
    }

    /// `len` residues starting at 0-based `start`. A request running past
    /// the end of the sequence is truncated; a start outside it is an error.
    pub fn get_sub_sequence(&self, name: &str, start: i64, len: i64) -> Result<String> {
        let entry = self.index.lookup(name)?;

        if len < 0 {
            return Err(Error::OutOfRange(format!("negative length {}", len)));
        }
        if len == 0 {
            return Ok(String::new());
        }
        if start < 0 || start as u64 >= entry.length {
            return Err(Error::OutOfRange(format!(
                "offset {} outside {} (length {})",
                start, name, entry.length
            )));
        }

        let start = start as u64;
        let len = (len as u64).min(entry.length - start);
        self.read_residues(entry, start, len)
    }

    /// Residues covered by a parsed region specifier.
    ///
    /// A span whose end repeats the start's sequence name, as in
    /// `chr1:5..chr1:9`, is served as the range `chr1:5..9`. Spans across
    /// two different sequences are rejected.
    pub fn fetch(&self, region: &RegionSpec) -> Result<String> {
        if region.is_cross_sequence() {
            return Err(Error::InvalidInput(format!(
                "cross-sequence region {} cannot be retrieved",
                region
            )));
        }

        match (region.start, region.length()) {
            (Some(start), Some(len)) if len > 0 => {
                self.get_sub_sequence(&region.sequence_name, start - 1, len)
            }
            (Some(_), _) => Err(Error::OutOfRange(format!("reversed range {}", region))),
            (None, _) => self.get_sequence(&region.sequence_name),
        }
    }

    fn read_residues(&self, entry: &FaiEntry, start: u64, len: u64) -> Result<String> {
        if len == 0 {
            return Ok(String::new());
        }

        let range = byte_range(entry, start, len);
        debug!(
            sequence = %entry.name,
            start,
            len,
            byte_start = range.start,
            byte_end = range.end,
            "reading residues"
        );

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(range.start))?;
        let mut buf = vec![0u8; range.len() as usize];
        file.read_exact(&mut buf).map_err(|e| {
            Error::Format(format!(
                "{} is shorter than its index says ({})",
                self.path.display(),
                e
            ))
        })?;

        let residues = strip_terminators(&buf, entry, start, len);
        Ok(String::from_utf8_lossy(&residues).into_owned())
    }
}

/// Bytes spanning the first through last requested residue
pub fn byte_range(entry: &FaiEntry, start: u64, len: u64) -> ByteRange {
    let first = entry.byte_offset(start);
    let last = entry.byte_offset(start + len - 1);
    ByteRange {
        start: first,
        end: last + 1,
    }
}

/// Collect `len` residues from a buffer that begins at residue `start`,
/// skipping the terminator bytes at each line boundary.
fn strip_terminators(buf: &[u8], entry: &FaiEntry, start: u64, len: u64) -> Vec<u8> {
    let len = len as usize;
    let line_bases = entry.line_bases as usize;
    let terminator = entry.terminator_width() as usize;

    let mut out = Vec::with_capacity(len);
    let mut column = (start % entry.line_bases) as usize;
    let mut i = 0;

    while out.len() < len {
        let take = (line_bases - column).min(len - out.len());
        out.extend_from_slice(&buf[i..i + take]);
        i += take + terminator;
        column = 0;
    }

    out
}
