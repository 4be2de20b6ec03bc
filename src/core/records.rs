//! Record data structures flowing through the deduplication pipeline.
//!
//! A [`FunctionRecord`] is produced by the upstream extraction collaborator
//! and consumed exactly once; it is never mutated. Derived state lives in
//! [`QualityMetrics`], [`RecordDecision`], and [`KeptRecord`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a near-duplicate cluster, dense per run.
pub type ClusterId = u64;

/// A raw extracted code unit with opaque provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Source repository (opaque to this core)
    pub repo: String,

    /// Commit the unit was extracted at
    #[serde(default)]
    pub commit: String,

    /// Path of the source file within the repository
    pub path: String,

    /// Name of the extracted unit, when the extractor provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Language tag assigned by the extractor
    pub language: String,

    /// First line of the unit in the source file (1-based; 0 when unknown)
    #[serde(default)]
    pub start_line: usize,

    /// Last line of the unit in the source file (inclusive; 0 when unknown)
    #[serde(default)]
    pub end_line: usize,

    /// Raw code text
    pub code: String,

    /// Authored or extractor-fabricated docstring, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
}

impl FunctionRecord {
    /// Stable provenance identifier used in decisions and logs.
    pub fn provenance_id(&self) -> String {
        format!(
            "{}@{}:{}#{}-{}",
            self.repo, self.commit, self.path, self.start_line, self.end_line
        )
    }

    /// Inclusive line span from provenance, when the extractor supplied one.
    pub fn line_span(&self) -> Option<usize> {
        if self.start_line == 0 && self.end_line == 0 {
            return None;
        }
        self.end_line.checked_sub(self.start_line).map(|d| d + 1)
    }
}

/// Structural quality metrics computed per record, independent of dedup order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Lines of code (inclusive line span)
    pub loc: usize,

    /// Cyclomatic complexity (decision points plus one baseline)
    pub cyclomatic: u32,

    /// Maximum lexical nesting depth
    pub max_nesting_depth: u32,

    /// Docstring matched the synthetic rule table
    pub synthetic_docstring: bool,
}

/// Terminal state of a record after its single pass through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    /// Record survived all stages
    Kept,
    /// Record was dropped by one of the stages
    Dropped,
}

/// Reason a record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropReason {
    /// Failed one or more quality gate bounds
    #[serde(rename = "DROPPED_QUALITY")]
    Quality,

    /// Normalized text byte-identical to an earlier record
    #[serde(rename = "DROPPED_EXACT_DUP")]
    ExactDuplicate,

    /// Confirmed near-duplicate of an earlier canonical record
    #[serde(rename = "DROPPED_NEAR_DUP")]
    NearDuplicate,

    /// Record malformed; metrics could not be computed
    #[serde(rename = "PARSE_FAILURE")]
    ParseFailure,
}

impl DropReason {
    /// Wire-format name of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quality => "DROPPED_QUALITY",
            Self::ExactDuplicate => "DROPPED_EXACT_DUP",
            Self::NearDuplicate => "DROPPED_NEAR_DUP",
            Self::ParseFailure => "PARSE_FAILURE",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-record terminal outcome, recorded for every input for traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDecision {
    /// Position of the record in the input sequence
    pub index: usize,

    /// Provenance identifier of the record
    pub record_id: String,

    /// Terminal state
    pub status: RecordStatus,

    /// Drop reason, absent for kept records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<DropReason>,

    /// Human-readable detail (violated bound, parse failure cause)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Cluster the record belongs to, when dedup reached it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<ClusterId>,

    /// Provenance id of the cluster's canonical record, for duplicates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<String>,
}

/// A record that survived the full pipeline, with its derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeptRecord {
    /// The original record, unchanged
    #[serde(flatten)]
    pub record: FunctionRecord,

    /// Structural metrics computed by the quality gate
    pub metrics: QualityMetrics,

    /// Near-duplicate cluster this record is canonical for
    pub cluster_id: ClusterId,
}
