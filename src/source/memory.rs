use super::{Placement, RecordSource, place};
use crate::region::ReferenceRange;
use crate::types::{AlignmentRecord, ReferenceSequence};
use crate::{Error, Result};

/// In-memory record source.
///
/// Without an index it replays records in the order given. With
/// [`MemorySource::indexed`], `set_region` sorts the records by coordinate
/// and serves only the window the region covers, the way an indexed file
/// would.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    references: Vec<ReferenceSequence>,
    records: Vec<AlignmentRecord>,
    indexed: bool,
    cursor: usize,
    window: Option<ReferenceRange>,
}

impl MemorySource {
    pub fn new(references: Vec<ReferenceSequence>, records: Vec<AlignmentRecord>) -> Self {
        Self {
            references,
            records,
            ..Default::default()
        }
    }

    /// Mark the source as having a positional index
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

impl RecordSource for MemorySource {
    fn references(&self) -> &[ReferenceSequence] {
        &self.references
    }

    fn next_record(&mut self) -> Result<Option<AlignmentRecord>> {
        while let Some(record) = self.records.get(self.cursor).copied() {
            self.cursor += 1;
            match self.window.as_ref().map(|range| place(range, &record)) {
                None | Some(Placement::Inside) => return Ok(Some(record)),
                Some(Placement::Before) => continue,
                Some(Placement::After) => {
                    self.cursor = self.records.len();
                    break;
                }
            }
        }
        Ok(None)
    }

    fn is_index_loaded(&self) -> bool {
        self.indexed
    }

    fn set_region(&mut self, range: &ReferenceRange) -> Result<()> {
        if !self.indexed {
            return Err(Error::Seek("no index loaded".to_string()));
        }

        // unmapped records (-1) sort last, as in a coordinate-sorted file
        self.records
            .sort_by_key(|r| (r.reference_id < 0, r.reference_id, r.position));
        self.cursor = 0;
        self.window = Some(*range);
        Ok(())
    }
}
