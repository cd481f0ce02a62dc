//! Record stream abstraction for alignment counting.
//!
//! The counter only needs a forward cursor over `(reference id, position,
//! length)` triples plus an optional way to jump to a region. Sources expose
//! that through [`RecordSource`], so the counting logic does not care whether
//! records come from a BAM file or from memory.
//!
//! # Implementations
//!
//! - [`MemorySource`] - records held in a `Vec`
//! - [`crate::formats::BamSource`] - BAM files and streams via noodles
//!
//! Sources release their handles when dropped, including on error paths.

mod memory;

pub use memory::MemorySource;

use crate::Result;
use crate::region::ReferenceRange;
use crate::types::{AlignmentRecord, ReferenceSequence};

/// Forward-only cursor over alignment records
pub trait RecordSource {
    /// Reference sequences, indexed by reference id
    fn references(&self) -> &[ReferenceSequence];

    /// Next record, or `None` at the end of the stream or region
    fn next_record(&mut self) -> Result<Option<AlignmentRecord>>;

    /// Try to find and load a positional index. Returns whether one is loaded.
    fn locate_index(&mut self) -> Result<bool> {
        Ok(self.is_index_loaded())
    }

    fn is_index_loaded(&self) -> bool;

    /// Position the cursor at the start of `range` and bound further reads
    /// by its end. Fails with `Error::Seek` when the source cannot seek.
    fn set_region(&mut self, range: &ReferenceRange) -> Result<()>;
}

/// Where a record from a coordinate-sorted stream falls relative to a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Before,
    Inside,
    After,
}

pub(crate) fn place(range: &ReferenceRange, record: &AlignmentRecord) -> Placement {
    if range.is_passed_by(record) {
        Placement::After
    } else if record.reference_id < range.left_ref_id
        || (record.reference_id == range.left_ref_id
            && record.position + record.length < range.left_pos)
    {
        Placement::Before
    } else {
        Placement::Inside
    }
}
