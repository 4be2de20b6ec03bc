//! # Shardsmith: Corpus Deduplication & Quality Gating Engine
//!
//! Shardsmith turns raw extracted code units into a clean training corpus.
//! It is the normalization, deduplication, and quality-gating core of a
//! shard-building pipeline:
//!
//! - **Normalization**: canonical comparison form for raw code text
//! - **Exact Deduplication**: content-hash detection of byte-identical code
//! - **Near Deduplication**: MinHash signatures + LSH banding for sub-linear
//!   similarity search, with candidate confirmation before any merge
//! - **Quality Gating**: structural metrics (LOC, cyclomatic complexity,
//!   nesting depth, synthetic-docstring detection) against configured bounds
//!
//! Repository discovery, ingestion, security/license scanning, task-dataset
//! formatting, and schema validation are external collaborators; this crate
//! consumes pre-extracted [`FunctionRecord`]s and produces kept records plus
//! a run summary.
//!
//! ## Quick Start
//!
//! ```rust
//! use shardsmith::{CorpusPipeline, MemorySink, ShardsmithConfig};
//! use shardsmith::core::records::FunctionRecord;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = CorpusPipeline::new(ShardsmithConfig::default())?;
//!     let records: Vec<FunctionRecord> = Vec::new();
//!
//!     let mut sink = MemorySink::new();
//!     let report = pipeline.run(records, &mut sink)?;
//!     println!("kept {} of {}", report.summary.kept, report.summary.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Reproducibility
//!
//! A run is a single deterministic pass: identical input order and identical
//! configuration (shingle size, permutation count, band/row split, thresholds,
//! seed) reproduce an identical kept set, including identical canonical
//! choices. All similarity hashing is seeded xxh3, stable across runs and
//! machines.

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Core engine modules
pub mod core {
    //! Core pipeline data structures and orchestration.

    pub mod config;
    pub mod errors;
    pub mod pipeline;
    pub mod records;
}

// Specialized detection algorithms
pub mod detectors {
    //! Deduplication and quality detectors.

    pub mod exact;
    pub mod lsh;
    pub mod minhash;
    pub mod normalize;
    pub mod quality;
    pub mod resolver;
}

// Output sinks
pub mod io {
    //! Kept-record output sinks.

    pub mod sinks;
}

// Re-export primary types for convenience
pub use core::config::{DedupConfig, QualityGateConfig, ShardsmithConfig};
pub use core::errors::{Result, ShardsmithError};
pub use core::pipeline::{CorpusPipeline, RunReport, RunSummary};
pub use core::records::{DropReason, FunctionRecord, KeptRecord, QualityMetrics, RecordDecision};
pub use io::sinks::{JsonlSink, MemorySink, RecordSink};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
