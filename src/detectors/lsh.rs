//! LSH banding index for sub-linear similarity candidate retrieval.
//!
//! A P-length MinHash signature is split into `bands` bands of `rows` rows;
//! each band's slice hashes to a bucket key, and records sharing any bucket
//! become similarity candidates. Two records of true Jaccard similarity `s`
//! surface as candidates with probability `1 - (1 - s^r)^b`, so the band/row
//! split positions the characteristic threshold `(1/b)^(1/r)` of that curve.
//! Candidates are only ever merged after confirmation against the stored
//! signatures; a false positive here costs one similarity estimate, a false
//! negative costs recall.

use ahash::{AHashMap, AHashSet};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::core::errors::{Result, ShardsmithError};
use crate::detectors::minhash::MinHashSignature;

/// Band/row split of a MinHash signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandPlan {
    /// Number of bands
    pub bands: usize,

    /// Rows per band
    pub rows: usize,
}

impl BandPlan {
    /// Build a plan from an explicit split; `bands * rows` must equal the
    /// signature length.
    pub fn explicit(bands: usize, rows: usize, num_permutations: usize) -> Result<Self> {
        if bands == 0 || rows == 0 {
            return Err(ShardsmithError::lsh("bands and rows must be positive"));
        }
        if bands * rows != num_permutations {
            return Err(ShardsmithError::lsh(format!(
                "band/row split {}x{} does not cover signature length {}",
                bands, rows, num_permutations
            )));
        }
        Ok(Self { bands, rows })
    }

    /// Derive a split from a target similarity threshold.
    ///
    /// Scans the divisor pairs of the signature length and picks the one
    /// whose characteristic threshold is closest to the target from below,
    /// biasing toward recall: pairs at or above the target then surface with
    /// high probability, and the extra candidates below it are discarded by
    /// similarity confirmation.
    pub fn for_threshold(num_permutations: usize, threshold: f64) -> Result<Self> {
        if num_permutations == 0 {
            return Err(ShardsmithError::lsh("signature length must be positive"));
        }

        let mut best_under: Option<(Self, f64)> = None;
        let mut flattest: Option<(Self, f64)> = None;

        for rows in 1..=num_permutations {
            if num_permutations % rows != 0 {
                continue;
            }
            let bands = num_permutations / rows;
            let plan = Self { bands, rows };
            let characteristic = plan.characteristic_threshold();

            if characteristic <= threshold
                && best_under.is_none_or(|(_, c)| characteristic > c)
            {
                best_under = Some((plan, characteristic));
            }
            if flattest.is_none_or(|(_, c)| characteristic < c) {
                flattest = Some((plan, characteristic));
            }
        }

        let (plan, _) = best_under
            .or(flattest)
            .ok_or_else(|| ShardsmithError::lsh("no band/row split available"))?;
        Ok(plan)
    }

    /// The similarity at which the candidate probability curve crosses ~0.5.
    pub fn characteristic_threshold(&self) -> f64 {
        (1.0 / self.bands as f64).powf(1.0 / self.rows as f64)
    }

    /// Probability that a pair of true similarity `s` shares at least one
    /// bucket: `1 - (1 - s^r)^b`.
    pub fn candidate_probability(&self, s: f64) -> f64 {
        1.0 - (1.0 - s.powi(self.rows as i32)).powi(self.bands as i32)
    }

    /// Signature length this plan covers.
    pub fn num_permutations(&self) -> usize {
        self.bands * self.rows
    }
}

/// Banded bucket index over MinHash signatures.
#[derive(Debug)]
pub struct LshIndex {
    plan: BandPlan,
    seed: u64,
    bands: Vec<AHashMap<u64, Vec<u32>>>,
    signatures: AHashMap<u32, MinHashSignature>,
}

impl LshIndex {
    /// Create an empty index for the given band plan.
    pub fn new(plan: BandPlan, seed: u64) -> Self {
        Self {
            plan,
            seed,
            bands: vec![AHashMap::new(); plan.bands],
            signatures: AHashMap::new(),
        }
    }

    /// The band plan this index was built with.
    pub fn plan(&self) -> BandPlan {
        self.plan
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// True when no record has been indexed.
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Insert a record's signature into every band bucket it belongs to.
    pub fn insert(&mut self, seq: u32, signature: MinHashSignature) -> Result<()> {
        if signature.len() != self.plan.num_permutations() {
            return Err(ShardsmithError::lsh(format!(
                "signature length {} does not match band plan {}x{}",
                signature.len(),
                self.plan.bands,
                self.plan.rows
            )));
        }

        for (band_idx, band) in self.bands.iter_mut().enumerate() {
            let start = band_idx * self.plan.rows;
            let slice = &signature.values()[start..start + self.plan.rows];
            let key = band_key(slice, self.seed, band_idx);
            band.entry(key).or_default().push(seq);
        }

        self.signatures.insert(seq, signature);
        Ok(())
    }

    /// Return the ids co-bucketed with the given signature, sorted and
    /// deduplicated so iteration follows arrival order.
    pub fn query(&self, signature: &MinHashSignature) -> Vec<u32> {
        if signature.len() != self.plan.num_permutations() {
            return Vec::new();
        }

        let mut candidates: AHashSet<u32> = AHashSet::new();
        for (band_idx, band) in self.bands.iter().enumerate() {
            let start = band_idx * self.plan.rows;
            let slice = &signature.values()[start..start + self.plan.rows];
            let key = band_key(slice, self.seed, band_idx);
            if let Some(ids) = band.get(&key) {
                candidates.extend(ids.iter().copied());
            }
        }

        let mut out: Vec<u32> = candidates.into_iter().collect();
        out.sort_unstable();
        out
    }

    /// Stored signature of an indexed record.
    pub fn signature(&self, seq: u32) -> Option<&MinHashSignature> {
        self.signatures.get(&seq)
    }
}

fn band_key(slice: &[u64], seed: u64, band_idx: usize) -> u64 {
    let mut bytes = Vec::with_capacity(slice.len() * 8);
    for value in slice {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    xxh3_64_with_seed(&bytes, seed.wrapping_add(band_idx as u64))
}
