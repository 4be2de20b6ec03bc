//! Pipeline coordinator.
//!
//! Drives records through Quality Gate → Exact-Dedup → Near-Dup Resolver in
//! one deterministic pass and appends survivors to a [`RecordSink`].
//!
//! The pass has two phases. The pure phase (normalization, content hashing,
//! signature generation, quality metrics) touches no shared state and runs
//! on rayon workers, preserving input order. The fold phase owns the
//! mutable indexes — the exact-dedup hash map and the LSH buckets are plain
//! structs owned here, never process-wide state — and resolves each record
//! to exactly one terminal state before the next begins. Appending the kept
//! record is the terminal, side-effect-free step per record, so an aborted
//! run leaves the output valid up to the last fully appended record.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::ShardsmithConfig;
use crate::core::errors::{Result, ShardsmithError};
use crate::core::records::{
    ClusterId, DropReason, FunctionRecord, KeptRecord, QualityMetrics, RecordDecision,
    RecordStatus,
};
use crate::detectors::exact::{
    content_fingerprint, content_hash, ContentHash, ExactDedupIndex, ExactOutcome,
};
use crate::detectors::lsh::BandPlan;
use crate::detectors::minhash::{MinHashBuilder, MinHashSignature};
use crate::detectors::normalize::normalize;
use crate::detectors::quality::QualityGate;
use crate::detectors::resolver::{NearDupResolver, Resolution};
use crate::io::sinks::RecordSink;

/// Aggregate counts and distributions for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records consumed
    pub total: usize,

    /// Records kept
    pub kept: usize,

    /// Records dropped by the quality gate
    pub dropped_quality: usize,

    /// Records dropped as byte-identical duplicates
    pub dropped_exact_dup: usize,

    /// Records dropped as confirmed near-duplicates
    pub dropped_near_dup: usize,

    /// Records dropped as malformed
    pub parse_failures: usize,

    /// Number of clusters formed
    pub clusters: usize,

    /// Cluster size -> number of clusters of that size
    pub cluster_size_distribution: BTreeMap<usize, usize>,

    /// Fraction of consumed records dropped as duplicates (exact + near)
    pub duplication_ratio: f64,
}

/// Full result of one pipeline run: the summary plus the per-record
/// terminal decisions, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Aggregate counts and distributions
    pub summary: RunSummary,

    /// One terminal decision per input record
    pub decisions: Vec<RecordDecision>,
}

/// Per-record output of the parallel pure phase.
struct Prepared {
    record_id: String,
    hash: ContentHash,
    fingerprint: u64,
    normalized_len: usize,
    signature: MinHashSignature,
    metrics: std::result::Result<QualityMetrics, String>,
}

/// Coordinates one deterministic deduplication pass per run.
///
/// Construction validates the configuration pre-flight; a pipeline that
/// exists can run. The pipeline itself is immutable and reusable — all
/// per-run index state is created inside [`run`](Self::run), keeping runs
/// composable and testable in isolation.
#[derive(Debug)]
pub struct CorpusPipeline {
    config: ShardsmithConfig,
    gate: QualityGate,
    builder: MinHashBuilder,
    plan: BandPlan,
}

impl CorpusPipeline {
    /// Build a pipeline, validating the configuration before any record is
    /// processed.
    pub fn new(config: ShardsmithConfig) -> Result<Self> {
        config.validate()?;

        let plan = match (config.dedup.bands, config.dedup.rows) {
            (Some(bands), Some(rows)) => {
                BandPlan::explicit(bands, rows, config.dedup.num_permutations)?
            }
            _ => BandPlan::for_threshold(config.dedup.num_permutations, config.dedup.threshold)?,
        };

        let gate = QualityGate::new(config.quality.clone())?;
        let builder = MinHashBuilder::from_config(&config.dedup);

        debug!(
            bands = plan.bands,
            rows = plan.rows,
            characteristic = plan.characteristic_threshold(),
            "resolved LSH band plan"
        );

        Ok(Self {
            config,
            gate,
            builder,
            plan,
        })
    }

    /// The validated configuration this pipeline runs with.
    pub fn config(&self) -> &ShardsmithConfig {
        &self.config
    }

    /// The band/row split in effect for this pipeline.
    pub fn band_plan(&self) -> BandPlan {
        self.plan
    }

    /// Run the full pass over `records`, appending kept records to `sink`
    /// in processing order.
    pub fn run<S>(
        &self,
        records: impl IntoIterator<Item = FunctionRecord>,
        sink: &mut S,
    ) -> Result<RunReport>
    where
        S: RecordSink + ?Sized,
    {
        let records: Vec<FunctionRecord> = records.into_iter().collect();

        let prepared: Vec<Prepared> = records.par_iter().map(|r| self.prepare(r)).collect();
        debug!(total = records.len(), "pure phase complete");

        self.fold(records, prepared, sink)
    }

    /// Pure per-record phase: normalization, hashing, signature, metrics.
    fn prepare(&self, record: &FunctionRecord) -> Prepared {
        let normalized = normalize(&record.code);
        let metrics = self
            .gate
            .measure(record, &normalized)
            .map_err(|e| e.to_string());

        Prepared {
            record_id: record.provenance_id(),
            hash: content_hash(&normalized),
            fingerprint: content_fingerprint(&normalized),
            normalized_len: normalized.len(),
            signature: self.builder.signature(&normalized),
            metrics,
        }
    }

    /// Sequential fold over the ordered stream; single writer for all
    /// shared index state.
    fn fold<S>(
        &self,
        records: Vec<FunctionRecord>,
        prepared: Vec<Prepared>,
        sink: &mut S,
    ) -> Result<RunReport>
    where
        S: RecordSink + ?Sized,
    {
        let total = records.len();
        let mut decisions: Vec<RecordDecision> = Vec::with_capacity(total);
        let mut exact = ExactDedupIndex::new();
        let mut resolver = NearDupResolver::new(
            self.plan,
            self.config.dedup.seed,
            self.config.dedup.threshold,
        );
        let mut cluster_sizes: IndexMap<ClusterId, usize> = IndexMap::new();

        for (index, (record, prep)) in records.into_iter().zip(prepared).enumerate() {
            let metrics = match prep.metrics {
                Err(detail) => {
                    decisions.push(dropped(
                        index,
                        prep.record_id,
                        DropReason::ParseFailure,
                        Some(detail),
                        None,
                        None,
                    ));
                    continue;
                }
                Ok(metrics) => metrics,
            };

            let verdict = self.gate.evaluate(&metrics);
            if !verdict.passed() {
                let detail = verdict.first_message().map(str::to_string);
                decisions.push(dropped(
                    index,
                    prep.record_id,
                    DropReason::Quality,
                    detail,
                    None,
                    None,
                ));
                continue;
            }

            if let ExactOutcome::Duplicate { canonical_index } =
                exact.insert(index, prep.hash, prep.fingerprint, prep.normalized_len)
            {
                let canonical = &decisions[canonical_index];
                let cluster_id = canonical.cluster_id;
                let canonical_id = canonical.record_id.clone();
                if let Some(cluster_id) = cluster_id {
                    *cluster_sizes.entry(cluster_id).or_insert(0) += 1;
                }
                decisions.push(dropped(
                    index,
                    prep.record_id,
                    DropReason::ExactDuplicate,
                    None,
                    cluster_id,
                    Some(canonical_id),
                ));
                continue;
            }

            let seq = u32::try_from(index).map_err(|_| {
                ShardsmithError::pipeline("near_dedup", "record index exceeds u32 range")
            })?;
            match resolver.resolve(seq, prep.signature)? {
                Resolution::NearDuplicate {
                    canonical_seq,
                    cluster_id,
                    similarity,
                } => {
                    let canonical_id = decisions[canonical_seq as usize].record_id.clone();
                    *cluster_sizes.entry(cluster_id).or_insert(0) += 1;
                    decisions.push(dropped(
                        index,
                        prep.record_id,
                        DropReason::NearDuplicate,
                        Some(format!("estimated Jaccard {similarity:.3}")),
                        Some(cluster_id),
                        Some(canonical_id),
                    ));
                }
                Resolution::Canonical { cluster_id } => {
                    let kept = KeptRecord {
                        record,
                        metrics,
                        cluster_id,
                    };
                    sink.append(&kept)?;
                    *cluster_sizes.entry(cluster_id).or_insert(0) += 1;
                    decisions.push(RecordDecision {
                        index,
                        record_id: prep.record_id,
                        status: RecordStatus::Kept,
                        reason: None,
                        detail: None,
                        cluster_id: Some(cluster_id),
                        canonical_id: None,
                    });
                }
            }
        }

        let summary = summarize(total, &decisions, &cluster_sizes);
        info!(
            total = summary.total,
            kept = summary.kept,
            dropped_exact_dup = summary.dropped_exact_dup,
            dropped_near_dup = summary.dropped_near_dup,
            dropped_quality = summary.dropped_quality,
            parse_failures = summary.parse_failures,
            clusters = summary.clusters,
            "run complete"
        );

        Ok(RunReport { summary, decisions })
    }
}

fn dropped(
    index: usize,
    record_id: String,
    reason: DropReason,
    detail: Option<String>,
    cluster_id: Option<ClusterId>,
    canonical_id: Option<String>,
) -> RecordDecision {
    RecordDecision {
        index,
        record_id,
        status: RecordStatus::Dropped,
        reason: Some(reason),
        detail,
        cluster_id,
        canonical_id,
    }
}

fn summarize(
    total: usize,
    decisions: &[RecordDecision],
    cluster_sizes: &IndexMap<ClusterId, usize>,
) -> RunSummary {
    let mut kept = 0usize;
    let mut dropped_quality = 0usize;
    let mut dropped_exact_dup = 0usize;
    let mut dropped_near_dup = 0usize;
    let mut parse_failures = 0usize;

    for decision in decisions {
        match decision.reason {
            None => kept += 1,
            Some(DropReason::Quality) => dropped_quality += 1,
            Some(DropReason::ExactDuplicate) => dropped_exact_dup += 1,
            Some(DropReason::NearDuplicate) => dropped_near_dup += 1,
            Some(DropReason::ParseFailure) => parse_failures += 1,
        }
    }

    let mut cluster_size_distribution: BTreeMap<usize, usize> = BTreeMap::new();
    for size in cluster_sizes.values() {
        *cluster_size_distribution.entry(*size).or_insert(0) += 1;
    }

    let duplicates = dropped_exact_dup + dropped_near_dup;
    let duplication_ratio = if total == 0 {
        0.0
    } else {
        duplicates as f64 / total as f64
    };

    RunSummary {
        total,
        kept,
        dropped_quality,
        dropped_exact_dup,
        dropped_near_dup,
        parse_failures,
        clusters: cluster_sizes.len(),
        cluster_size_distribution,
        duplication_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sinks::MemorySink;

    fn record(path: &str, code: &str) -> FunctionRecord {
        FunctionRecord {
            repo: "acme/widgets".to_string(),
            commit: "c0ffee".to_string(),
            path: path.to_string(),
            name: None,
            language: "python".to_string(),
            start_line: 0,
            end_line: 0,
            code: code.to_string(),
            docstring: None,
        }
    }

    fn lenient_config() -> ShardsmithConfig {
        let mut config = ShardsmithConfig::default();
        config.quality.min_loc = 1;
        config
    }

    #[test]
    fn test_invalid_config_rejected_preflight() {
        let mut config = ShardsmithConfig::default();
        config.dedup.num_permutations = 0;
        assert!(CorpusPipeline::new(config).is_err());
    }

    #[test]
    fn test_empty_run() {
        let pipeline = CorpusPipeline::new(ShardsmithConfig::default()).unwrap();
        let mut sink = MemorySink::new();
        let report = pipeline.run(Vec::new(), &mut sink).unwrap();

        assert_eq!(report.summary.total, 0);
        assert_eq!(report.summary.kept, 0);
        assert_eq!(report.summary.clusters, 0);
        assert!(report.summary.duplication_ratio.abs() < f64::EPSILON);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_malformed_record_dropped_and_run_continues() {
        let pipeline = CorpusPipeline::new(lenient_config()).unwrap();
        let mut sink = MemorySink::new();

        let records = vec![record("a.py", ""), record("b.py", "x = 1\n")];
        let report = pipeline.run(records, &mut sink).unwrap();

        assert_eq!(report.summary.parse_failures, 1);
        assert_eq!(report.summary.kept, 1);
        assert_eq!(report.decisions[0].reason, Some(DropReason::ParseFailure));
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn test_exact_duplicate_inherits_canonical_cluster() {
        let pipeline = CorpusPipeline::new(lenient_config()).unwrap();
        let mut sink = MemorySink::new();

        let code = "def f(x):\n    return x + 1\n";
        let records = vec![record("a.py", code), record("b.py", code)];
        let report = pipeline.run(records, &mut sink).unwrap();

        assert_eq!(report.summary.kept, 1);
        assert_eq!(report.summary.dropped_exact_dup, 1);

        let canonical = &report.decisions[0];
        let duplicate = &report.decisions[1];
        assert_eq!(canonical.status, RecordStatus::Kept);
        assert_eq!(duplicate.cluster_id, canonical.cluster_id);
        assert_eq!(duplicate.canonical_id.as_deref(), Some(canonical.record_id.as_str()));
        assert_eq!(report.summary.cluster_size_distribution.get(&2), Some(&1));
    }

    #[test]
    fn test_duplication_ratio() {
        let pipeline = CorpusPipeline::new(lenient_config()).unwrap();
        let mut sink = MemorySink::new();

        let code = "def g(y):\n    return y * 2\n";
        let records = vec![
            record("a.py", code),
            record("b.py", code),
            record("c.py", "totally = 'different'\n"),
            record("d.py", ""),
        ];
        let report = pipeline.run(records, &mut sink).unwrap();

        // 1 exact dup of 4 consumed records
        assert!((report.summary.duplication_ratio - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_decisions_cover_every_input_in_order() {
        let pipeline = CorpusPipeline::new(lenient_config()).unwrap();
        let mut sink = MemorySink::new();

        let records = vec![
            record("a.py", "a = 1\n"),
            record("b.py", "b = 2\n"),
            record("c.py", "c = 3\n"),
        ];
        let report = pipeline.run(records, &mut sink).unwrap();

        assert_eq!(report.decisions.len(), 3);
        for (i, decision) in report.decisions.iter().enumerate() {
            assert_eq!(decision.index, i);
        }
    }
}
