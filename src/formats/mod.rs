//! File-format readers.
//!
//! - [`FastaIndex`] - `.fai` style layout table for line-wrapped FASTA files
//! - [`FastaReference`] - random access to FASTA residues through the index
//! - [`BamSource`] - BAM alignment records, with BAI-driven region seeks
//!
//! # Index-Based Queries
//!
//! Both formats translate genomic coordinates into file offsets through an
//! index: the FASTA index by line-wrap arithmetic, the BAM index through
//! BGZF virtual positions.

mod bam;
mod fasta;
mod reference;

pub use bam::{BamInput, BamSource};
pub use fasta::{FaiEntry, FastaIndex};
pub use reference::{FastaReference, byte_range, index_path_for};

/// Half-open byte range within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}
