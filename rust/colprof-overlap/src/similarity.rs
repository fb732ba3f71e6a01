use std::{fmt, str::FromStr};

use colprof_common::{Result, error::Error};
use colprof_term_index::ColumnTerms;

use crate::node::OverlapNode;

/// The value computed for every overlapping pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Similarity {
    /// The overlap itself.
    #[default]
    Overlap,
    /// `overlap / (|a| + |b| - overlap)`.
    Jaccard,
    /// Weight of the shared elements on both sides over the total weight of
    /// both nodes. Needs weights on every node.
    WeightedJaccard,
}

impl FromStr for Similarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Similarity> {
        match s.to_ascii_lowercase().as_str() {
            "overlap" => Ok(Similarity::Overlap),
            "jaccard" | "ji" => Ok(Similarity::Jaccard),
            "weighted-jaccard" | "wji" => Ok(Similarity::WeightedJaccard),
            _ => Err(Error::invalid_arg(
                "similarity",
                format!("unknown similarity '{s}'"),
            )),
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Similarity::Overlap => "overlap",
            Similarity::Jaccard => "jaccard",
            Similarity::WeightedJaccard => "weighted-jaccard",
        })
    }
}

/// How term counts inside a column are scaled into weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnWeights {
    /// Count divided by the column's total count.
    ColumnSize,
    /// Count divided by the column's largest count.
    ColumnMax,
}

impl ColumnWeights {
    pub fn column_weights(self, column: &ColumnTerms) -> Vec<f64> {
        let scale = match self {
            ColumnWeights::ColumnSize => column.total_count(),
            ColumnWeights::ColumnMax => column.max_count(),
        }
        .max(1) as f64;
        column
            .counts
            .iter()
            .map(|&count| count as f64 / scale)
            .collect()
    }
}

impl FromStr for ColumnWeights {
    type Err = Error;

    fn from_str(s: &str) -> Result<ColumnWeights> {
        match s.to_ascii_lowercase().as_str() {
            "colsize" | "column-size" => Ok(ColumnWeights::ColumnSize),
            "colmax" | "column-max" => Ok(ColumnWeights::ColumnMax),
            _ => Err(Error::invalid_arg(
                "weights",
                format!("unknown column weighting '{s}'"),
            )),
        }
    }
}

/// Result of comparing two nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub overlap: u64,
    /// Weight of the shared elements, counted on both sides.
    pub shared_weight: f64,
}

/// Walks the sorted element lists of both nodes once.
///
/// A shared element contributes the smaller of its two multiplicities to the
/// overlap.
pub fn compare(a: &OverlapNode, b: &OverlapNode) -> Comparison {
    let (mut i, mut j) = (0, 0);
    let mut overlap = 0;
    let mut shared_weight = 0.0;
    while i < a.elements.len() && j < b.elements.len() {
        match a.elements[i].cmp(&b.elements[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                overlap += a.size_at(i).min(b.size_at(j));
                shared_weight += a.weight_at(i) + b.weight_at(j);
                i += 1;
                j += 1;
            }
        }
    }
    Comparison {
        overlap,
        shared_weight,
    }
}

impl Similarity {
    /// The similarity of two nodes, given their comparison.
    pub fn value(self, a: &OverlapNode, b: &OverlapNode, cmp: &Comparison) -> f64 {
        match self {
            Similarity::Overlap => cmp.overlap as f64,
            Similarity::Jaccard => {
                let union = a.size() + b.size() - cmp.overlap;
                if union == 0 {
                    0.0
                } else {
                    cmp.overlap as f64 / union as f64
                }
            }
            Similarity::WeightedJaccard => {
                let total = a.total_weight() + b.total_weight();
                if total <= 0.0 {
                    0.0
                } else {
                    cmp.shared_weight / total
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use colprof_term_index::ColumnTerms;

    use super::{ColumnWeights, Similarity, compare};
    use crate::node::OverlapNode;

    #[test]
    fn test_jaccard() {
        let a = OverlapNode::new(0, [1, 2, 3, 4]);
        let b = OverlapNode::new(1, [3, 4, 5]);
        let cmp = compare(&a, &b);
        assert_eq!(cmp.overlap, 2);
        assert_eq!(Similarity::Jaccard.value(&a, &b, &cmp), 0.4);
        assert_eq!(Similarity::Overlap.value(&a, &b, &cmp), 2.0);
    }

    #[test]
    fn test_weighted_jaccard() {
        // Shared weight (0.5 + 0.25) + (0.25 + 0.5), A-only 0.25, B-only 0.25.
        let a = OverlapNode::new(0, [1, 2, 3])
            .with_weights(vec![0.5, 0.25, 0.25])
            .unwrap();
        let b = OverlapNode::new(1, [1, 2, 4])
            .with_weights(vec![0.25, 0.5, 0.25])
            .unwrap();
        let cmp = compare(&a, &b);
        assert_eq!(cmp.shared_weight, 1.5);
        assert_eq!(Similarity::WeightedJaccard.value(&a, &b, &cmp), 0.75);
    }

    #[test]
    fn test_multiplicities() {
        let a = OverlapNode::new(0, [1, 2]).with_sizes(vec![3, 2]).unwrap();
        let b = OverlapNode::new(1, [2, 7]).with_sizes(vec![2, 5]).unwrap();
        assert_eq!(compare(&a, &b).overlap, 2);
    }

    #[test]
    fn test_column_weights() {
        let column = ColumnTerms {
            terms: vec![1, 2, 3],
            counts: vec![2, 4, 2],
        };
        assert_eq!(
            ColumnWeights::ColumnSize.column_weights(&column),
            [0.25, 0.5, 0.25]
        );
        assert_eq!(
            ColumnWeights::ColumnMax.column_weights(&column),
            [0.5, 1.0, 0.5]
        );
        assert_eq!(
            "WJI".parse::<Similarity>().unwrap(),
            Similarity::WeightedJaccard
        );
        assert!("cosine".parse::<Similarity>().is_err());
    }
}
