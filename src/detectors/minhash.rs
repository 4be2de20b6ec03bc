//! Code-aware shingling and MinHash signature generation.
//!
//! Normalized text is tokenized into code-aware tokens (identifier and
//! number runs, operator runs), formed into k-token windows, and hashed into
//! a [`ShingleSet`]. A [`MinHashBuilder`] compresses the set into a
//! fixed-length [`MinHashSignature`] whose positional match fraction
//! estimates Jaccard similarity between the underlying shingle sets.
//!
//! All hashing is seeded xxh3: identical shingle sets with identical
//! (seed, permutation count) yield byte-identical signatures across runs
//! and machines.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::core::config::DedupConfig;

/// Odd 64-bit stride mixing the base seed into per-permutation seeds.
const SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Split text into code-aware tokens.
///
/// A token is either a maximal run of alphanumeric/underscore characters or
/// a maximal run of one repeated punctuation character (so `&&` and `||`
/// stay whole while `);` splits). Whitespace only separates.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut iter = text.char_indices().peekable();

    while let Some((start, ch)) = iter.next() {
        if ch.is_whitespace() {
            continue;
        }

        let mut end = start + ch.len_utf8();
        let word = ch.is_alphanumeric() || ch == '_';
        while let Some(&(next, c)) = iter.peek() {
            let same_class = if word {
                c.is_alphanumeric() || c == '_'
            } else {
                c == ch
            };
            if !same_class {
                break;
            }
            end = next + c.len_utf8();
            iter.next();
        }

        tokens.push(&text[start..end]);
    }

    tokens
}

/// Set of hashed k-token shingles, duplicates collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShingleSet {
    hashes: Vec<u64>,
}

impl ShingleSet {
    /// Number of distinct shingles.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// True when the set holds no shingles.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Iterate the shingle hashes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.hashes.iter().copied()
    }

    /// Exact Jaccard similarity with another shingle set.
    pub fn jaccard(&self, other: &Self) -> f64 {
        if self.is_empty() && other.is_empty() {
            return 1.0;
        }

        let mut intersection = 0usize;
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.hashes.len() && j < other.hashes.len() {
            match self.hashes[i].cmp(&other.hashes[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    intersection += 1;
                    i += 1;
                    j += 1;
                }
            }
        }

        let union = self.hashes.len() + other.hashes.len() - intersection;
        intersection as f64 / union as f64
    }
}

/// MinHash signature for efficient similarity estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinHashSignature {
    values: Vec<u64>,
}

impl MinHashSignature {
    /// Signature length (the permutation count it was built with).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the signature holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw signature values.
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Estimated Jaccard similarity with another signature.
    ///
    /// Returns `None` when the signatures were built with different
    /// permutation counts and cannot be compared.
    pub fn estimate_jaccard(&self, other: &Self) -> Option<f64> {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return None;
        }

        let matching = self
            .values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| a == b)
            .count();

        Some(matching as f64 / self.values.len() as f64)
    }
}

/// Builds shingle sets and MinHash signatures under one fixed parameter set.
#[derive(Debug, Clone)]
pub struct MinHashBuilder {
    num_permutations: usize,
    shingle_k: usize,
    seed: u64,
}

impl MinHashBuilder {
    /// Create a builder with explicit parameters.
    pub fn new(num_permutations: usize, shingle_k: usize, seed: u64) -> Self {
        Self {
            num_permutations,
            shingle_k,
            seed,
        }
    }

    /// Create a builder from the dedup configuration.
    pub fn from_config(config: &DedupConfig) -> Self {
        Self::new(config.num_permutations, config.shingle_k, config.seed)
    }

    /// Signature length produced by this builder.
    pub fn num_permutations(&self) -> usize {
        self.num_permutations
    }

    /// Build the shingle set for a normalized text.
    ///
    /// Texts shorter than `shingle_k` tokens contribute a single shingle
    /// covering all their tokens; an all-sentinel signature would otherwise
    /// make every short record collide with every other.
    pub fn shingles(&self, text: &str) -> ShingleSet {
        let tokens = tokenize(text);

        let mut seen: AHashSet<u64> = AHashSet::new();
        if tokens.is_empty() {
            return ShingleSet {
                hashes: Vec::new(),
            };
        }

        if tokens.len() < self.shingle_k {
            seen.insert(self.hash_window(&tokens));
        } else {
            for window in tokens.windows(self.shingle_k) {
                seen.insert(self.hash_window(window));
            }
        }

        let mut hashes: Vec<u64> = seen.into_iter().collect();
        hashes.sort_unstable();
        ShingleSet { hashes }
    }

    /// Compute the MinHash signature of a shingle set.
    pub fn signature_of(&self, shingles: &ShingleSet) -> MinHashSignature {
        let mut values = vec![u64::MAX; self.num_permutations];

        for shingle in shingles.iter() {
            let bytes = shingle.to_le_bytes();
            for (p, slot) in values.iter_mut().enumerate() {
                let hash = xxh3_64_with_seed(&bytes, self.permutation_seed(p));
                if hash < *slot {
                    *slot = hash;
                }
            }
        }

        MinHashSignature { values }
    }

    /// Shingle and sign a normalized text in one step.
    pub fn signature(&self, text: &str) -> MinHashSignature {
        self.signature_of(&self.shingles(text))
    }

    fn hash_window(&self, window: &[&str]) -> u64 {
        let joined = window.join(" ");
        xxh3_64_with_seed(joined.as_bytes(), self.seed)
    }

    fn permutation_seed(&self, p: usize) -> u64 {
        self.seed ^ (p as u64).wrapping_mul(SEED_STRIDE)
    }
}
