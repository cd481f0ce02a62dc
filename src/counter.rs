//! Region-constrained alignment counting.
//!
//! Three ways to walk a record stream, chosen once per call:
//!
//! - no region: count every record
//! - region and an index: seek to the region and count what the source yields
//! - region without an index: read everything and count records passing
//!   [`ReferenceRange::overlaps`]; unindexed streams are not assumed sorted,
//!   so the scan never stops early

use crate::Result;
use crate::region::{ReferenceRange, RegionSpec};
use crate::source::RecordSource;
use crate::types::CountStrategy;
use tracing::debug;

/// Outcome of a counting run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Count {
    pub count: u64,
    pub strategy: CountStrategy,
}

/// Count records in `source`, optionally constrained to `range`.
///
/// With a range, the source is first asked to locate its index. A failed
/// seek is reported as an error; there is no fallback to a linear scan.
pub fn count_alignments<S>(source: &mut S, range: Option<&ReferenceRange>) -> Result<Count>
where
    S: RecordSource + ?Sized,
{
    let index_loaded = match range {
        Some(_) => source.locate_index()?,
        None => false,
    };
    let strategy = CountStrategy::select(range.is_some(), index_loaded);
    debug!(?strategy, ?range, "counting alignments");

    let mut count = 0;
    match (strategy, range) {
        (CountStrategy::LinearScan, Some(range)) => {
            while let Some(record) = source.next_record()? {
                if range.overlaps(&record) {
                    count += 1;
                }
            }
        }
        (CountStrategy::IndexedSeek, Some(range)) => {
            source.set_region(range)?;
            while source.next_record()?.is_some() {
                count += 1;
            }
        }
        _ => {
            while source.next_record()?.is_some() {
                count += 1;
            }
        }
    }

    Ok(Count { count, strategy })
}

/// Resolve `region` against the source's references, then count.
/// An unresolvable region fails before any record is read.
pub fn count_region<S>(source: &mut S, region: Option<&RegionSpec>) -> Result<Count>
where
    S: RecordSource + ?Sized,
{
    let range = region
        .map(|spec| ReferenceRange::resolve(spec, source.references()))
        .transpose()?;
    count_alignments(source, range.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::source::MemorySource;
    use crate::types::{AlignmentRecord, ReferenceSequence};

    fn ten_records() -> Vec<AlignmentRecord> {
        (0..10).map(|i| AlignmentRecord::new(0, i * 10, 5)).collect()
    }

    fn refs() -> Vec<ReferenceSequence> {
        vec![
            ReferenceSequence::new("chr1", 1000),
            ReferenceSequence::new("chr2", 1000),
            ReferenceSequence::new("chr3", 1000),
        ]
    }

    #[test]
    fn test_no_region_counts_everything() {
        let mut records = ten_records();
        records.push(AlignmentRecord::new(-1, -1, 0));
        let mut source = MemorySource::new(refs(), records);
        let result = count_alignments(&mut source, None).unwrap();
        assert_eq!(result.count, 11);
        assert_eq!(result.strategy, CountStrategy::Unconstrained);
    }

    #[test]
    fn test_linear_scan_overlap() {
        let mut source = MemorySource::new(refs(), ten_records());
        let range = ReferenceRange::new(0, 15, 0, 50);
        let result = count_alignments(&mut source, Some(&range)).unwrap();
        // positions 10, 20, 30, 40, 50
        assert_eq!(result.count, 5);
        assert_eq!(result.strategy, CountStrategy::LinearScan);
    }

    #[test]
    fn test_linear_scan_does_not_stop_early_on_unsorted_input() {
        let mut records = ten_records();
        records.reverse();
        records.insert(3, AlignmentRecord::new(2, 0, 5));
        let mut source = MemorySource::new(refs(), records);
        let range = ReferenceRange::new(0, 15, 0, 50);
        assert_eq!(count_alignments(&mut source, Some(&range)).unwrap().count, 5);
    }

    #[test]
    fn test_indexed_seek_matches_linear_scan() {
        let range = ReferenceRange::new(0, 15, 0, 50);
        let mut source = MemorySource::new(refs(), ten_records()).indexed();
        let result = count_alignments(&mut source, Some(&range)).unwrap();
        assert_eq!(result.count, 5);
        assert_eq!(result.strategy, CountStrategy::IndexedSeek);
    }

    #[test]
    fn test_spanning_region_counts_middle_reference() {
        let records = vec![
            AlignmentRecord::new(0, 10, 5),
            AlignmentRecord::new(1, 100, 5),
            AlignmentRecord::new(1, 200, 5),
            AlignmentRecord::new(2, 150, 5),
            AlignmentRecord::new(2, 400, 5),
        ];
        let mut source = MemorySource::new(refs(), records);
        let range = ReferenceRange::new(0, 50, 2, 300);
        // both chr2 records and chr3:150 fall in the position box; chr1:10
        // ends too early and chr3:400 starts too late
        assert_eq!(count_alignments(&mut source, Some(&range)).unwrap().count, 3);
    }

    #[test]
    fn test_count_region_resolves_names() {
        let mut source = MemorySource::new(refs(), ten_records());
        let spec = RegionSpec::parse("chr1:16..51");
        assert_eq!(count_region(&mut source, Some(&spec)).unwrap().count, 5);
    }

    #[test]
    fn test_count_region_unknown_name_reads_nothing() {
        let mut source = MemorySource::new(refs(), ten_records());
        let spec = RegionSpec::parse("chrX:1..10");
        let err = count_region(&mut source, Some(&spec)).unwrap_err();
        assert!(matches!(err, Error::Resolve(_)));
        // cursor untouched
        assert!(source.next_record().unwrap().is_some());
    }

    struct BrokenSeek(MemorySource);

    impl RecordSource for BrokenSeek {
        fn references(&self) -> &[ReferenceSequence] {
            self.0.references()
        }
        fn next_record(&mut self) -> Result<Option<AlignmentRecord>> {
            self.0.next_record()
        }
        fn is_index_loaded(&self) -> bool {
            true
        }
        fn set_region(&mut self, _range: &ReferenceRange) -> Result<()> {
            Err(Error::Seek("refused".to_string()))
        }
    }

    #[test]
    fn test_seek_failure_does_not_fall_back() {
        let mut source = BrokenSeek(MemorySource::new(refs(), ten_records()));
        let range = ReferenceRange::new(0, 15, 0, 50);
        let err = count_alignments(&mut source, Some(&range)).unwrap_err();
        assert!(matches!(err, Error::Seek(_)));
    }
}
