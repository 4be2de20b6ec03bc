//! Near-duplicate confirmation and cluster assignment.
//!
//! The resolver owns the LSH index and processes records in a fixed,
//! deterministic order. A record either confirms against an
//! already-canonical candidate at or above the similarity threshold and is
//! absorbed into that candidate's cluster, or becomes canonical of a fresh
//! cluster and is indexed so later records can match against it. Clusters
//! are never retroactively re-merged; earlier records win ties.

use ahash::AHashMap;

use crate::core::errors::{Result, ShardsmithError};
use crate::core::records::ClusterId;
use crate::detectors::lsh::{BandPlan, LshIndex};
use crate::detectors::minhash::MinHashSignature;

/// Outcome of resolving one record against the near-dup index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// No candidate confirmed; the record is canonical for a new cluster
    Canonical {
        /// Cluster the record now anchors
        cluster_id: ClusterId,
    },

    /// A canonical candidate confirmed at or above the threshold
    NearDuplicate {
        /// Sequence id of the confirming canonical record
        canonical_seq: u32,
        /// Cluster the record is absorbed into
        cluster_id: ClusterId,
        /// Estimated Jaccard similarity to the canonical
        similarity: f64,
    },
}

/// Resolves records into near-duplicate clusters via the LSH index.
#[derive(Debug)]
pub struct NearDupResolver {
    index: LshIndex,
    threshold: f64,
    cluster_by_seq: AHashMap<u32, ClusterId>,
    next_cluster: ClusterId,
}

impl NearDupResolver {
    /// Create a resolver over an empty index.
    pub fn new(plan: BandPlan, seed: u64, threshold: f64) -> Self {
        Self {
            index: LshIndex::new(plan, seed),
            threshold,
            cluster_by_seq: AHashMap::new(),
            next_cluster: 0,
        }
    }

    /// Number of canonical records (equals the number of clusters).
    pub fn canonical_count(&self) -> usize {
        self.index.len()
    }

    /// Resolve a record's signature against all earlier canonicals.
    ///
    /// Candidates are visited in arrival order; the best similarity wins
    /// and ties break toward the earliest canonical.
    pub fn resolve(&mut self, seq: u32, signature: MinHashSignature) -> Result<Resolution> {
        let mut best: Option<(u32, f64)> = None;

        for candidate in self.index.query(&signature) {
            let Some(candidate_sig) = self.index.signature(candidate) else {
                continue;
            };
            let Some(similarity) = signature.estimate_jaccard(candidate_sig) else {
                continue;
            };
            if similarity >= self.threshold
                && best.is_none_or(|(_, best_sim)| similarity > best_sim)
            {
                best = Some((candidate, similarity));
            }
        }

        match best {
            Some((canonical_seq, similarity)) => {
                let cluster_id =
                    *self.cluster_by_seq.get(&canonical_seq).ok_or_else(|| {
                        ShardsmithError::pipeline(
                            "near_dedup",
                            format!("canonical {canonical_seq} has no cluster"),
                        )
                    })?;
                Ok(Resolution::NearDuplicate {
                    canonical_seq,
                    cluster_id,
                    similarity,
                })
            }
            None => {
                let cluster_id = self.next_cluster;
                self.next_cluster += 1;
                self.cluster_by_seq.insert(seq, cluster_id);
                self.index.insert(seq, signature)?;
                Ok(Resolution::Canonical { cluster_id })
            }
        }
    }
}
