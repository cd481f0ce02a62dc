use crate::region::ReferenceRange;
use crate::source::{Placement, RecordSource, place};
use crate::types::{AlignmentRecord, ReferenceSequence};
use crate::{Error, Result};
use noodles::bam;
use noodles::bam::bai;
use noodles::bgzf;
use noodles::core::Position;
use noodles::core::region::Interval;
use noodles::csi::binning_index::BinningIndex;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Byte input behind a BAM stream: a seekable file or stdin
pub enum BamInput {
    File(File),
    Stdin(io::Stdin),
}

impl Read for BamInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BamInput::File(file) => file.read(buf),
            BamInput::Stdin(stdin) => stdin.read(buf),
        }
    }
}

impl Seek for BamInput {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            BamInput::File(file) => file.seek(pos),
            BamInput::Stdin(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "cannot seek standard input",
            )),
        }
    }
}

/// BAM record source.
///
/// Decodes records sequentially. When a BAI index is found, `set_region`
/// seeks to the first index chunk overlapping the range and stops at the
/// first record past its end.
pub struct BamSource {
    reader: bam::io::Reader<bgzf::Reader<BamInput>>,
    references: Vec<ReferenceSequence>,
    path: Option<PathBuf>,
    index_path: Option<PathBuf>,
    index: Option<bai::Index>,
    window: Option<ReferenceRange>,
    record: bam::Record,
    exhausted: bool,
}

impl BamSource {
    pub fn open<P: AsRef<Path>>(bam_path: P) -> Result<Self> {
        let path = bam_path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::NotFound(format!("{}: {}", path.display(), e)))?;
        let mut source = Self::from_input(BamInput::File(file))?;
        source.path = Some(path.to_path_buf());
        Ok(source)
    }

    pub fn from_stdin() -> Result<Self> {
        Self::from_input(BamInput::Stdin(io::stdin()))
    }

    fn from_input(input: BamInput) -> Result<Self> {
        // bam::io::Reader::new wraps the input in a BGZF reader - don't double-wrap
        let mut reader = bam::io::Reader::new(input);
        let header = reader
            .read_header()
            .map_err(|e| Error::Format(format!("failed to read BAM header: {}", e)))?;

        let references = header
            .reference_sequences()
            .iter()
            .map(|(name, reference)| {
                ReferenceSequence::new(name.to_string(), usize::from(reference.length()) as u64)
            })
            .collect();

        Ok(Self {
            reader,
            references,
            path: None,
            index_path: None,
            index: None,
            window: None,
            record: bam::Record::default(),
            exhausted: false,
        })
    }

    /// Use an explicit BAI location instead of the conventional ones
    pub fn with_index_path(mut self, index_path: Option<PathBuf>) -> Self {
        self.index_path = index_path;
        self
    }

    /// Index locations to try, in order: explicit, `<bam>.bai`, `<stem>.bai`
    fn index_candidates(&self) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = self.index_path.iter().cloned().collect();
        if let Some(path) = &self.path {
            candidates.push(PathBuf::from(format!("{}.bai", path.display())));
            candidates.push(path.with_extension("bai"));
        }
        candidates
    }
}

impl RecordSource for BamSource {
    fn references(&self) -> &[ReferenceSequence] {
        &self.references
    }

    fn next_record(&mut self) -> Result<Option<AlignmentRecord>> {
        while !self.exhausted {
            let n = self
                .reader
                .read_record(&mut self.record)
                .map_err(|e| Error::Format(format!("failed to read BAM record: {}", e)))?;
            if n == 0 {
                self.exhausted = true;
                break;
            }

            let record = decode_record(&self.record)?;
            match self.window.as_ref().map(|range| place(range, &record)) {
                None | Some(Placement::Inside) => return Ok(Some(record)),
                Some(Placement::Before) => continue,
                Some(Placement::After) => self.exhausted = true,
            }
        }
        Ok(None)
    }

    fn locate_index(&mut self) -> Result<bool> {
        if self.index.is_some() {
            return Ok(true);
        }
        // stdin cannot seek, so an index would be useless
        if self.path.is_none() {
            return Ok(false);
        }

        for candidate in self.index_candidates() {
            if !candidate.exists() {
                continue;
            }
            match bai::read(&candidate) {
                Ok(index) => {
                    debug!(path = %candidate.display(), "loaded BAM index");
                    self.index = Some(index);
                    return Ok(true);
                }
                Err(e) => {
                    warn!(path = %candidate.display(), error = %e, "unreadable BAM index");
                }
            }
        }

        Ok(false)
    }

    fn is_index_loaded(&self) -> bool {
        self.index.is_some()
    }

    fn set_region(&mut self, range: &ReferenceRange) -> Result<()> {
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| Error::Seek("no BAM index loaded".to_string()))?;

        if range.left_ref_id < 0 || range.right_ref_id < range.left_ref_id {
            return Err(Error::Seek(format!("invalid reference range {:?}", range)));
        }

        // first chunk of the first reference in the range that has data
        let mut first_chunk = None;
        for ref_id in range.left_ref_id..=range.right_ref_id {
            let start = if ref_id == range.left_ref_id {
                to_position(range.left_pos)?
            } else {
                Position::MIN
            };
            // open-ended up to the right reference; the index caps the bound itself
            let interval = if ref_id == range.right_ref_id {
                Interval::from(start..=to_position(range.right_pos)?)
            } else {
                Interval::from(start..)
            };

            let chunks = index
                .query(ref_id as usize, interval)
                .map_err(|e| Error::Seek(format!("index query failed: {}", e)))?;

            if let Some(chunk_start) = chunks.iter().map(|chunk| chunk.start()).min() {
                first_chunk = Some(chunk_start);
                break;
            }
        }

        match first_chunk {
            Some(virtual_position) => {
                self.reader
                    .get_mut()
                    .seek(virtual_position)
                    .map_err(|e| Error::Seek(format!("seek failed: {}", e)))?;
                self.exhausted = false;
            }
            None => self.exhausted = true,
        }

        self.window = Some(*range);
        Ok(())
    }
}

/// 0-based position to a 1-based noodles position
fn to_position(pos: i64) -> Result<Position> {
    usize::try_from(pos + 1)
        .ok()
        .and_then(|p| Position::try_from(p).ok())
        .ok_or_else(|| Error::Seek(format!("invalid position {}", pos)))
}

fn decode_record(record: &bam::Record) -> Result<AlignmentRecord> {
    let invalid = |e: io::Error| Error::Format(format!("invalid BAM record: {}", e));

    let reference_id = record
        .reference_sequence_id()
        .transpose()
        .map_err(invalid)?
        .map_or(-1, |id| id as i32);

    let position = record
        .alignment_start()
        .transpose()
        .map_err(invalid)?
        .map_or(-1, |start| usize::from(start) as i64 - 1);

    let length = record.sequence().len() as i64;

    Ok(AlignmentRecord::new(reference_id, position, length))
}
