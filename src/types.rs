use serde::Serialize;

/// The slice of an alignment record the counter looks at.
///
/// Unmapped records carry `-1` for both reference id and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub reference_id: i32,
    /// 0-based leftmost position
    pub position: i64,
    /// query sequence length
    pub length: i64,
}

impl AlignmentRecord {
    pub fn new(reference_id: i32, position: i64, length: i64) -> Self {
        Self {
            reference_id,
            position,
            length,
        }
    }
}

/// A named reference sequence in the id namespace of a record stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSequence {
    pub name: String,
    pub length: u64,
}

impl ReferenceSequence {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// How the counter walked the record stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStrategy {
    /// No region: every record counts
    Unconstrained,
    /// Region applied by seeking the stream with its index
    IndexedSeek,
    /// Region applied by testing every record
    LinearScan,
}

impl CountStrategy {
    pub fn select(has_region: bool, index_loaded: bool) -> Self {
        match (has_region, index_loaded) {
            (false, _) => CountStrategy::Unconstrained,
            (true, true) => CountStrategy::IndexedSeek,
            (true, false) => CountStrategy::LinearScan,
        }
    }
}

/// `fetch --json` output line
#[derive(Debug, Serialize)]
pub struct SequenceOutput {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
}

/// `count --json` output
#[derive(Debug, Serialize)]
pub struct CountOutput {
    pub count: u64,
    pub strategy: CountStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}
