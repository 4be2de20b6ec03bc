//! Exact-duplicate detection via content hashing.
//!
//! Byte-identical normalized texts map to the same blake3 digest; the first
//! record seen under a digest becomes canonical and every later record under
//! the same digest is a duplicate. A secondary xxh3 fingerprint of the
//! normalized text rides along so a digest collision between materially
//! different texts is detected and resolved conservatively: the colliding
//! record is treated as distinct, never merged away.

use ahash::AHashMap;
use tracing::warn;
use xxhash_rust::xxh3::xxh3_64;

/// Fixed-width content digest of a normalized text.
pub type ContentHash = [u8; 32];

/// Compute the blake3 content digest of a normalized text.
pub fn content_hash(normalized: &str) -> ContentHash {
    *blake3::hash(normalized.as_bytes()).as_bytes()
}

/// Compute the secondary collision-check fingerprint of a normalized text.
pub fn content_fingerprint(normalized: &str) -> u64 {
    xxh3_64(normalized.as_bytes())
}

/// Outcome of inserting a record into the exact-dedup index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactOutcome {
    /// First record under this digest; it proceeds as canonical
    Canonical,

    /// Digest already present; the record is a byte-identical duplicate
    Duplicate {
        /// Input index of the canonical record holding this digest
        canonical_index: usize,
    },
}

#[derive(Debug)]
struct ExactEntry {
    index: usize,
    fingerprint: u64,
    len: usize,
}

/// Content-hash index detecting byte-identical normalized code.
#[derive(Debug, Default)]
pub struct ExactDedupIndex {
    entries: AHashMap<ContentHash, ExactEntry>,
}

impl ExactDedupIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct digests seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no record has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a record's digest; first insertion under a digest wins.
    ///
    /// `fingerprint` and `len` describe the normalized text and back the
    /// collision check. A record whose digest matches an entry with a
    /// different fingerprint is logged and treated as distinct.
    pub fn insert(
        &mut self,
        index: usize,
        hash: ContentHash,
        fingerprint: u64,
        len: usize,
    ) -> ExactOutcome {
        match self.entries.entry(hash) {
            std::collections::hash_map::Entry::Occupied(occupied) => {
                let entry = occupied.get();
                if entry.fingerprint != fingerprint || entry.len != len {
                    warn!(
                        canonical_index = entry.index,
                        colliding_index = index,
                        "content hash collision between materially different texts; \
                         keeping both records"
                    );
                    return ExactOutcome::Canonical;
                }
                ExactOutcome::Duplicate {
                    canonical_index: entry.index,
                }
            }
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(ExactEntry {
                    index,
                    fingerprint,
                    len,
                });
                ExactOutcome::Canonical
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_text(index: usize, text: &str, index_map: &mut ExactDedupIndex) -> ExactOutcome {
        index_map.insert(
            index,
            content_hash(text),
            content_fingerprint(text),
            text.len(),
        )
    }

    #[test]
    fn test_first_insertion_is_canonical() {
        let mut index = ExactDedupIndex::new();
        assert_eq!(
            insert_text(0, "def f():\n    return 1\n", &mut index),
            ExactOutcome::Canonical
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_identical_text_marked_duplicate_of_first() {
        let mut index = ExactDedupIndex::new();
        let text = "def f():\n    return 1\n";

        insert_text(3, text, &mut index);
        assert_eq!(
            insert_text(7, text, &mut index),
            ExactOutcome::Duplicate { canonical_index: 3 }
        );
        assert_eq!(
            insert_text(9, text, &mut index),
            ExactOutcome::Duplicate { canonical_index: 3 }
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_distinct_texts_both_canonical() {
        let mut index = ExactDedupIndex::new();
        assert_eq!(insert_text(0, "a = 1\n", &mut index), ExactOutcome::Canonical);
        assert_eq!(insert_text(1, "a = 2\n", &mut index), ExactOutcome::Canonical);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_collision_anomaly_keeps_both() {
        let mut index = ExactDedupIndex::new();
        let hash = content_hash("x = 1\n");

        // Same digest, different fingerprint: forced collision
        assert_eq!(index.insert(0, hash, 11, 6), ExactOutcome::Canonical);
        assert_eq!(index.insert(1, hash, 22, 9), ExactOutcome::Canonical);

        // The original entry still wins for true duplicates
        assert_eq!(
            index.insert(2, hash, 11, 6),
            ExactOutcome::Duplicate { canonical_index: 0 }
        );
    }
}
