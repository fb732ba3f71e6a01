//! Parallel all-pairs overlap computation.

use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::{AHashMap, AHashSet};
use colprof_common::{Result, error::Error};

use crate::{
    index::{OverlapIndex, PairStats},
    node::OverlapNode,
    similarity::{Similarity, compare},
};

/// Settings of a pairwise run.
#[derive(Debug, Clone)]
pub struct OverlapConfig {
    /// Size of the dedicated worker pool.
    pub threads: usize,
    /// Minimum similarity of a surfaced pair. Zero or below keeps every pair
    /// with a non-zero overlap.
    pub threshold: f64,
    pub similarity: Similarity,
    /// Lock shards of the result index.
    pub shards: usize,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        OverlapConfig {
            threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
            threshold: 0.0,
            similarity: Similarity::Overlap,
            shards: OverlapIndex::DEFAULT_SHARDS,
        }
    }
}

impl OverlapConfig {
    /// Whether a pair with the given overlap and similarity is surfaced.
    #[inline]
    pub fn passes(&self, overlap: u64, similarity: f64) -> bool {
        overlap > 0 && (self.threshold <= 0.0 || similarity >= self.threshold)
    }
}

/// Computes the overlap of every unordered pair of nodes.
///
/// A fixed pool of workers pulls node positions from a shared cursor. The
/// worker owning node `i` compares it with every node whose id is greater,
/// so each unordered pair is visited exactly once regardless of the input
/// order and the number of threads. The result does not depend on the
/// thread count; only the order of inserts does.
pub struct PairwiseOverlapEngine {
    config: OverlapConfig,
    pool: rayon::ThreadPool,
}

impl PairwiseOverlapEngine {
    pub fn new(config: OverlapConfig) -> Result<PairwiseOverlapEngine> {
        colprof_common::verify_arg!(threads, config.threads > 0);
        colprof_common::verify_arg!(threshold, !config.threshold.is_nan());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("colprof-overlap-{i}"))
            .build()
            .map_err(|e| Error::invalid_operation(format!("start overlap workers: {e}")))?;
        Ok(PairwiseOverlapEngine { config, pool })
    }

    pub fn config(&self) -> &OverlapConfig {
        &self.config
    }

    /// Runs the all-pairs scan and returns the surfaced pairs.
    ///
    /// Node ids must be unique. Weighted Jaccard needs weights on every
    /// node.
    pub fn run(&self, nodes: &[OverlapNode]) -> Result<OverlapIndex> {
        self.validate(nodes)?;
        let self_sizes = nodes
            .iter()
            .map(|node| (node.id, node.self_overlap()))
            .collect::<AHashMap<_, _>>();
        let index = OverlapIndex::new(self.config.shards, self_sizes);
        if nodes.len() < 2 {
            return Ok(index);
        }

        log::info!(
            "computing {} overlap over {} nodes with {} threads",
            self.config.similarity,
            nodes.len(),
            self.config.threads
        );
        let cursor = AtomicUsize::new(0);
        let compared = self.pool.broadcast(|_| self.scan(nodes, &cursor, &index));
        let comparisons: u64 = compared.iter().sum();
        log::info!(
            "{} comparisons, {} pairs surfaced",
            comparisons,
            index.len()
        );
        Ok(index)
    }

    /// Worker loop: takes the next node until the cursor runs past the end.
    fn scan(&self, nodes: &[OverlapNode], cursor: &AtomicUsize, index: &OverlapIndex) -> u64 {
        let report_every = (nodes.len() / 20).max(1);
        let mut comparisons = 0;
        loop {
            let pos = cursor.fetch_add(1, Ordering::Relaxed);
            let Some(node) = nodes.get(pos) else {
                return comparisons;
            };
            if pos % report_every == 0 {
                log::debug!("overlap scan at node {pos}/{}", nodes.len());
            }
            for other in nodes.iter().filter(|other| other.id > node.id) {
                comparisons += 1;
                let cmp = compare(node, other);
                if cmp.overlap == 0 {
                    continue;
                }
                let similarity = self.config.similarity.value(node, other, &cmp);
                if self.config.passes(cmp.overlap, similarity) {
                    index.insert(
                        node.id,
                        other.id,
                        PairStats {
                            overlap: cmp.overlap,
                            similarity,
                        },
                    );
                }
            }
        }
    }

    fn validate(&self, nodes: &[OverlapNode]) -> Result<()> {
        let mut ids = AHashSet::with_capacity(nodes.len());
        for node in nodes {
            node.validate()?;
            if !ids.insert(node.id) {
                return Err(Error::invalid_arg(
                    "nodes",
                    format!("node id {} occurs more than once", node.id),
                ));
            }
            if self.config.similarity == Similarity::WeightedJaccard && node.weights.is_none() {
                return Err(Error::invalid_arg(
                    "nodes",
                    format!("weighted jaccard needs weights, node {} has none", node.id),
                ));
            }
        }
        Ok(())
    }
}
