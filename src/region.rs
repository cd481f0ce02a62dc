//! Region specifiers and reference ranges.
//!
//! A region specifier is the textual form users type on the command line or
//! stream on stdin:
//!
//! - `chr1` - the whole sequence
//! - `chr1:500` - a single base
//! - `chr1:500..1000` - an inclusive range
//! - `chr1:500..chr3:750` - a span across references (counting only)
//!
//! Coordinates are 1-based and inclusive. Parsing never fails: malformed
//! numbers read as `0`, and consumers decide whether the result is usable.
//!
//! [`ReferenceRange`] is the 0-based form of a specifier after its names
//! have been resolved against a list of reference sequences.

use crate::types::{AlignmentRecord, ReferenceSequence};
use crate::{Error, Result};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A parsed region specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSpec {
    pub sequence_name: String,
    /// 1-based inclusive start, `None` for the whole sequence
    pub start: Option<i64>,
    /// 1-based inclusive end; equals `start` for single-base regions
    pub end: Option<i64>,
    /// Second sequence name of a `seq1:start..seq2:end` span
    pub end_sequence: Option<String>,
}

impl RegionSpec {
    /// Parse a region string. Total: every input yields a spec.
    pub fn parse(region: &str) -> Self {
        let Some(colon) = region.find(':') else {
            return Self::whole(region);
        };

        let sequence_name = region[..colon].to_string();
        let coords = &region[colon + 1..];

        let Some(dots) = coords.find("..") else {
            let pos = parse_leading_int(coords);
            return Self {
                sequence_name,
                start: Some(pos),
                end: Some(pos),
                end_sequence: None,
            };
        };

        let start = parse_leading_int(&coords[..dots]);
        let tail = &coords[dots + 2..];

        // `seq1:start..seq2:end` keeps the grammar total; retrieval rejects it
        let (end_sequence, end) = match tail.find(':') {
            Some(c) => (Some(tail[..c].to_string()), parse_leading_int(&tail[c + 1..])),
            None => (None, parse_leading_int(tail)),
        };

        Self {
            sequence_name,
            start: Some(start),
            end: Some(end),
            end_sequence,
        }
    }

    /// Whole-sequence region
    pub fn whole(name: &str) -> Self {
        Self {
            sequence_name: name.to_string(),
            start: None,
            end: None,
            end_sequence: None,
        }
    }

    pub fn is_whole_sequence(&self) -> bool {
        self.start.is_none()
    }

    /// True when the end names a different sequence; `chr1:5..chr1:9` is
    /// an ordinary range on `chr1`.
    pub fn is_cross_sequence(&self) -> bool {
        self.end_sequence
            .as_deref()
            .is_some_and(|name| name != self.sequence_name)
    }

    /// Number of residues covered, `None` for the whole sequence.
    ///
    /// A reversed range yields a value `<= 0`.
    pub fn length(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start + 1),
            (Some(_), None) => Some(1),
            _ => None,
        }
    }
}

impl FromStr for RegionSpec {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for RegionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sequence_name)?;
        match (self.start, self.end, &self.end_sequence) {
            (Some(start), Some(end), Some(seq)) => write!(f, ":{}..{}:{}", start, seq, end),
            (Some(start), Some(end), None) if start != end => write!(f, ":{}..{}", start, end),
            (Some(start), _, _) => write!(f, ":{}", start),
            _ => Ok(()),
        }
    }
}

/// Leading-integer parse: optional whitespace and sign, then digits.
/// Anything unparseable reads as 0.
fn parse_leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    if negative { -value } else { value }
}

/// A 0-based range over reference ids, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceRange {
    pub left_ref_id: i32,
    pub left_pos: i64,
    pub right_ref_id: i32,
    pub right_pos: i64,
}

impl ReferenceRange {
    pub fn new(left_ref_id: i32, left_pos: i64, right_ref_id: i32, right_pos: i64) -> Self {
        Self {
            left_ref_id,
            left_pos,
            right_ref_id,
            right_pos,
        }
    }

    /// Resolve a region specifier against the reference sequences of a
    /// record stream. Positions are converted to 0-based; an end past the
    /// reference end is clamped to its last base.
    pub fn resolve(spec: &RegionSpec, references: &[ReferenceSequence]) -> Result<Self> {
        let (left_ref_id, left_ref) = find_reference(references, &spec.sequence_name)?;
        let (right_ref_id, right_ref) = match &spec.end_sequence {
            Some(name) => find_reference(references, name)?,
            None => (left_ref_id, left_ref),
        };

        let left_pos = match spec.start {
            Some(start) if start < 1 => {
                return Err(Error::Resolve(format!(
                    "start position {} must be at least 1",
                    start
                )));
            }
            Some(start) => start - 1,
            None => 0,
        };

        if left_pos >= left_ref.length as i64 {
            return Err(Error::Resolve(format!(
                "start position {} is beyond the end of {} (length {})",
                left_pos + 1,
                left_ref.name,
                left_ref.length
            )));
        }

        let last_base = (right_ref.length as i64 - 1).max(0);
        let right_pos = match spec.end {
            Some(end) if end < 1 => {
                return Err(Error::Resolve(format!(
                    "end position {} must be at least 1",
                    end
                )));
            }
            Some(end) => (end - 1).min(last_base),
            None => last_base,
        };

        if right_ref_id < left_ref_id {
            return Err(Error::Resolve(format!(
                "{} comes before {} in the reference order",
                right_ref.name, left_ref.name
            )));
        }

        if right_ref_id == left_ref_id && right_pos < left_pos {
            return Err(Error::Resolve(format!(
                "reversed range {}..{} on {}",
                left_pos + 1,
                right_pos + 1,
                left_ref.name
            )));
        }

        Ok(Self::new(left_ref_id, left_pos, right_ref_id, right_pos))
    }

    /// Bounding-box overlap test. Reference ids and positions are compared
    /// independently, so the position bounds of the two ends also apply to
    /// references in between.
    pub fn overlaps(&self, record: &AlignmentRecord) -> bool {
        record.reference_id >= self.left_ref_id
            && (record.position + record.length) >= self.left_pos
            && record.reference_id <= self.right_ref_id
            && record.position <= self.right_pos
    }

    /// True once a coordinate-sorted stream has moved past this range.
    pub fn is_passed_by(&self, record: &AlignmentRecord) -> bool {
        record.reference_id < 0
            || record.reference_id > self.right_ref_id
            || (record.reference_id == self.right_ref_id && record.position > self.right_pos)
    }
}

fn find_reference<'a>(
    references: &'a [ReferenceSequence],
    name: &str,
) -> Result<(i32, &'a ReferenceSequence)> {
    references
        .iter()
        .enumerate()
        .find(|(_, r)| r.name == name)
        .map(|(i, r)| (i as i32, r))
        .ok_or_else(|| Error::Resolve(format!("unknown reference sequence: {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs() -> Vec<ReferenceSequence> {
        vec![
            ReferenceSequence::new("chr1", 1000),
            ReferenceSequence::new("chr2", 500),
            ReferenceSequence::new("chr3", 800),
        ]
    }

    #[test]
    fn test_parse_whole_sequence() {
        let spec = RegionSpec::parse("chr1");
        assert_eq!(spec.sequence_name, "chr1");
        assert_eq!(spec.start, None);
        assert_eq!(spec.end, None);
        assert!(spec.is_whole_sequence());
        assert_eq!(spec.length(), None);
    }

    #[test]
    fn test_parse_single_base() {
        let spec = RegionSpec::parse("chr1:5");
        assert_eq!(spec.start, Some(5));
        assert_eq!(spec.end, Some(5));
        assert_eq!(spec.length(), Some(1));
    }

    #[test]
    fn test_parse_range() {
        let spec = RegionSpec::parse("chr1:5..10");
        assert_eq!(spec.sequence_name, "chr1");
        assert_eq!(spec.start, Some(5));
        assert_eq!(spec.end, Some(10));
        assert_eq!(spec.length(), Some(6));
        assert!(!spec.is_cross_sequence());
    }

    #[test]
    fn test_parse_malformed_numbers_default_to_zero() {
        let spec = RegionSpec::parse("chr1:abc..xyz");
        assert_eq!(spec.start, Some(0));
        assert_eq!(spec.end, Some(0));

        let spec = RegionSpec::parse("chr1:");
        assert_eq!(spec.start, Some(0));

        let spec = RegionSpec::parse("chr1:12kb");
        assert_eq!(spec.start, Some(12));
    }

    #[test]
    fn test_parse_is_total_on_odd_input() {
        for input in ["", ":", "..", ":..", "a:b:c", "chr1:..", "chr1:5..", "x:-3..-1"] {
            let _ = RegionSpec::parse(input);
        }
        assert_eq!(RegionSpec::parse("").sequence_name, "");
        assert_eq!(RegionSpec::parse("x:-3..-1").start, Some(-3));
    }

    #[test]
    fn test_parse_cross_sequence() {
        let spec = RegionSpec::parse("chr1:100..chr3:50");
        assert_eq!(spec.sequence_name, "chr1");
        assert_eq!(spec.start, Some(100));
        assert_eq!(spec.end_sequence.as_deref(), Some("chr3"));
        assert_eq!(spec.end, Some(50));
        assert!(spec.is_cross_sequence());
    }

    #[test]
    fn test_parse_repeated_name_is_not_cross_sequence() {
        let spec = RegionSpec::parse("chr1:5..chr1:9");
        assert_eq!(spec.end_sequence.as_deref(), Some("chr1"));
        assert_eq!(spec.end, Some(9));
        assert_eq!(spec.length(), Some(5));
        assert!(!spec.is_cross_sequence());
    }

    #[test]
    fn test_display_matches_grammar() {
        for input in ["chr1", "chr1:5", "chr1:5..10", "chr1:5..chr2:9"] {
            assert_eq!(RegionSpec::parse(input).to_string(), input);
        }
    }

    #[test]
    fn test_resolve_range() {
        let range = ReferenceRange::resolve(&RegionSpec::parse("chr2:11..20"), &refs()).unwrap();
        assert_eq!(range, ReferenceRange::new(1, 10, 1, 19));
    }

    #[test]
    fn test_resolve_whole_reference() {
        let range = ReferenceRange::resolve(&RegionSpec::parse("chr3"), &refs()).unwrap();
        assert_eq!(range, ReferenceRange::new(2, 0, 2, 799));
    }

    #[test]
    fn test_resolve_clamps_end() {
        let range = ReferenceRange::resolve(&RegionSpec::parse("chr2:1..100000"), &refs()).unwrap();
        assert_eq!(range.right_pos, 499);
    }

    #[test]
    fn test_resolve_cross_reference() {
        let range =
            ReferenceRange::resolve(&RegionSpec::parse("chr1:100..chr3:50"), &refs()).unwrap();
        assert_eq!(range, ReferenceRange::new(0, 99, 2, 49));
    }

    #[test]
    fn test_resolve_errors() {
        for input in [
            "chrX",
            "chr1:0",
            "chr1:2000",
            "chr1:50..10",
            "chr3:1..chr1:5",
            "chr1:1..chrZ:5",
        ] {
            let err = ReferenceRange::resolve(&RegionSpec::parse(input), &refs()).unwrap_err();
            assert!(matches!(err, Error::Resolve(_)), "{} gave {:?}", input, err);
        }
    }

    #[test]
    fn test_overlap_single_reference() {
        let range = ReferenceRange::new(0, 15, 0, 50);
        assert!(range.overlaps(&AlignmentRecord::new(0, 10, 5)));
        assert!(range.overlaps(&AlignmentRecord::new(0, 50, 5)));
        assert!(!range.overlaps(&AlignmentRecord::new(0, 0, 5)));
        assert!(!range.overlaps(&AlignmentRecord::new(0, 60, 5)));
        assert!(!range.overlaps(&AlignmentRecord::new(1, 20, 5)));
    }

    #[test]
    fn test_overlap_spanning_references_is_permissive() {
        let range = ReferenceRange::new(0, 100, 2, 900);
        for pos in [95, 400, 900] {
            assert!(range.overlaps(&AlignmentRecord::new(1, pos, 5)));
        }
        // a record on the left reference past the right bound position still
        // fails the position test
        assert!(!range.overlaps(&AlignmentRecord::new(0, 901, 5)));
        assert!(!range.overlaps(&AlignmentRecord::new(1, 901, 5)));
        assert!(!range.overlaps(&AlignmentRecord::new(3, 400, 5)));
        assert!(!range.overlaps(&AlignmentRecord::new(-1, -1, 0)));
    }

    #[test]
    fn test_is_passed_by() {
        let range = ReferenceRange::new(0, 15, 1, 50);
        assert!(!range.is_passed_by(&AlignmentRecord::new(0, 900, 5)));
        assert!(!range.is_passed_by(&AlignmentRecord::new(1, 50, 5)));
        assert!(range.is_passed_by(&AlignmentRecord::new(1, 51, 5)));
        assert!(range.is_passed_by(&AlignmentRecord::new(2, 0, 5)));
        assert!(range.is_passed_by(&AlignmentRecord::new(-1, -1, 5)));
    }
}
