//! Pairwise overlap and similarity of equivalence classes and columns.
//!
//! Every node (a class or a column) is a sorted set of elements, optionally
//! carrying a multiplicity and a weight per element. The engine compares all
//! unordered node pairs on a fixed pool of worker threads and collects the
//! pairs that share elements into a sparse, symmetric [`OverlapIndex`].

pub mod engine;
pub mod index;
pub mod node;
pub mod output;
pub mod similarity;

pub use engine::{OverlapConfig, PairwiseOverlapEngine};
pub use index::{OverlapIndex, PairStats};
pub use node::{OverlapNode, class_column_nodes, column_class_nodes, column_term_nodes};
pub use output::write_pairs;
pub use similarity::{ColumnWeights, Similarity};
