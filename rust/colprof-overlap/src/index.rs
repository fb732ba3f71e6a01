//! Sparse symmetric pair index.

use std::sync::Mutex;

use ahash::AHashMap;

/// What is recorded for an overlapping pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairStats {
    pub overlap: u64,
    pub similarity: f64,
}

type Shard = Mutex<AHashMap<(u64, u64), PairStats>>;

/// Symmetric map from unordered id pairs to their overlap.
///
/// Pairs are stored once under `(min, max)` in the shard selected by the
/// lower id, each shard behind its own lock, so concurrent inserts for
/// different lower ids rarely contend. Pairs without overlap are never
/// stored; looking them up yields zero. The overlap of a node with itself is
/// its own size, answered from the node sizes without ever being stored.
pub struct OverlapIndex {
    shards: Vec<Shard>,
    self_sizes: AHashMap<u64, u64>,
}

impl OverlapIndex {
    pub const DEFAULT_SHARDS: usize = 64;

    pub fn new(shard_count: usize, self_sizes: AHashMap<u64, u64>) -> OverlapIndex {
        let shards = (0..shard_count.max(1))
            .map(|_| Mutex::new(AHashMap::new()))
            .collect();
        OverlapIndex { shards, self_sizes }
    }

    #[inline]
    fn key(a: u64, b: u64) -> (u64, u64) {
        if a <= b { (a, b) } else { (b, a) }
    }

    #[inline]
    fn shard(&self, lower: u64) -> &Shard {
        &self.shards[(lower % self.shards.len() as u64) as usize]
    }

    /// Records a pair. Self pairs and pairs without overlap are ignored.
    ///
    /// Returns `true` if the pair was stored.
    pub fn insert(&self, a: u64, b: u64, stats: PairStats) -> bool {
        if a == b || stats.overlap == 0 {
            return false;
        }
        let key = Self::key(a, b);
        self.shard(key.0)
            .lock()
            .expect("overlap shard lock poisoned")
            .insert(key, stats);
        true
    }

    /// The overlap of two nodes, in either order.
    pub fn overlap(&self, a: u64, b: u64) -> u64 {
        if a == b {
            return self.self_sizes.get(&a).copied().unwrap_or(0);
        }
        self.get(a, b).map_or(0, |stats| stats.overlap)
    }

    /// The recorded stats of a pair, if it was surfaced.
    pub fn get(&self, a: u64, b: u64) -> Option<PairStats> {
        let key = Self::key(a, b);
        self.shard(key.0)
            .lock()
            .expect("overlap shard lock poisoned")
            .get(&key)
            .copied()
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().expect("overlap shard lock poisoned").len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored pairs as `(lower, upper, stats)`, ordered by id pair.
    pub fn pairs(&self) -> Vec<(u64, u64, PairStats)> {
        let mut pairs = Vec::new();
        for shard in &self.shards {
            let shard = shard.lock().expect("overlap shard lock poisoned");
            pairs.extend(shard.iter().map(|(&(a, b), &stats)| (a, b, stats)));
        }
        pairs.sort_unstable_by_key(|&(a, b, _)| (a, b));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;

    use super::{OverlapIndex, PairStats};

    fn stats(overlap: u64) -> PairStats {
        PairStats {
            overlap,
            similarity: overlap as f64,
        }
    }

    #[test]
    fn test_symmetric_lookup() {
        let index = OverlapIndex::new(4, AHashMap::from_iter([(1, 5), (9, 2)]));
        assert!(index.insert(9, 1, stats(2)));
        assert!(!index.insert(3, 3, stats(7)));
        assert!(!index.insert(3, 4, stats(0)));
        assert_eq!(index.overlap(1, 9), 2);
        assert_eq!(index.overlap(9, 1), 2);
        assert_eq!(index.overlap(1, 1), 5);
        assert_eq!(index.overlap(3, 4), 0);
        assert_eq!(index.len(), 1);
        assert_eq!(index.pairs(), [(1, 9, stats(2))]);
    }
}
