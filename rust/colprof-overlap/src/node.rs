//! Overlap nodes and the builders turning class and term indexes into them.

use colprof_common::{Result, error::Error};
use colprof_eq::EquivalenceClassIndex;
use colprof_term_index::ColumnTermSets;

use crate::similarity::ColumnWeights;

/// One side of a pairwise comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapNode {
    pub id: u64,
    /// Element ids, strictly ascending.
    pub elements: Vec<u64>,
    /// Multiplicity of every element; `None` means one each.
    pub sizes: Option<Vec<u64>>,
    /// Weight of every element, used by weighted Jaccard.
    pub weights: Option<Vec<f64>>,
    /// Overlap of the node with itself, if it differs from [`size`](Self::size).
    pub self_overlap: Option<u64>,
}

impl OverlapNode {
    /// Creates a node from element ids in any order; duplicates are removed.
    pub fn new(id: u64, elements: impl IntoIterator<Item = u64>) -> OverlapNode {
        let mut elements = elements.into_iter().collect::<Vec<_>>();
        elements.sort_unstable();
        elements.dedup();
        OverlapNode {
            id,
            elements,
            sizes: None,
            weights: None,
            self_overlap: None,
        }
    }

    pub fn with_sizes(mut self, sizes: Vec<u64>) -> Result<OverlapNode> {
        colprof_common::verify_arg!(sizes, sizes.len() == self.elements.len());
        self.sizes = Some(sizes);
        Ok(self)
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<OverlapNode> {
        colprof_common::verify_arg!(weights, weights.len() == self.elements.len());
        self.weights = Some(weights);
        Ok(self)
    }

    #[inline]
    pub fn size_at(&self, pos: usize) -> u64 {
        self.sizes.as_ref().map_or(1, |sizes| sizes[pos])
    }

    #[inline]
    pub fn weight_at(&self, pos: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |weights| weights[pos])
    }

    /// Total multiplicity of the node: the overlap of the node with itself.
    pub fn size(&self) -> u64 {
        match &self.sizes {
            Some(sizes) => sizes.iter().sum(),
            None => self.elements.len() as u64,
        }
    }

    /// What `overlap(id, id)` reports for this node.
    pub fn self_overlap(&self) -> u64 {
        self.self_overlap.unwrap_or_else(|| self.size())
    }

    pub fn total_weight(&self) -> f64 {
        match &self.weights {
            Some(weights) => weights.iter().sum(),
            None => self.elements.len() as f64,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.elements.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::invalid_arg(
                "nodes",
                format!("elements of node {} are not strictly ascending", self.id),
            ));
        }
        let lengths_match = self.sizes.as_ref().is_none_or(|s| s.len() == self.elements.len())
            && self.weights.as_ref().is_none_or(|w| w.len() == self.elements.len());
        if !lengths_match {
            return Err(Error::invalid_arg(
                "nodes",
                format!("sizes or weights of node {} do not match its elements", self.id),
            ));
        }
        Ok(())
    }
}

/// Classes as sets of the columns they occur in.
///
/// Every column of a class counts with the class's term count, so two
/// classes overlap by the shared columns weighted by the smaller term count.
/// The overlap of a class with itself is its term count.
pub fn class_column_nodes(index: &EquivalenceClassIndex) -> Vec<OverlapNode> {
    index
        .iter()
        .map(|class| {
            let terms = class.term_count() as u64;
            let elements = class.columns().columns().map(u64::from).collect::<Vec<_>>();
            OverlapNode {
                id: class.id(),
                sizes: Some(vec![terms; elements.len()]),
                weights: None,
                self_overlap: Some(terms),
                elements,
            }
        })
        .collect()
}

/// Columns as sets of the classes occurring in them.
///
/// Every class counts with its term count, so the overlap of two columns is
/// the number of terms they share and a column's size is its term volume.
pub fn column_class_nodes(index: &EquivalenceClassIndex) -> Vec<OverlapNode> {
    let node_sizes = index.node_sizes();
    index
        .columns()
        .into_iter()
        .map(|(column, classes)| {
            let sizes = classes
                .iter()
                .map(|&class| node_sizes[class as usize] as u64)
                .collect::<Vec<_>>();
            let weights = sizes.iter().map(|&size| size as f64).collect();
            OverlapNode {
                id: u64::from(column),
                elements: classes,
                sizes: Some(sizes),
                weights: Some(weights),
                self_overlap: None,
            }
        })
        .collect()
}

/// Columns as sets of their terms, weighted by the term counts within each
/// column.
///
/// With `weights` set, every term carries its count divided by the column
/// scale (total count or largest count); otherwise nodes are unweighted.
pub fn column_term_nodes(
    columns: &ColumnTermSets,
    weights: Option<ColumnWeights>,
) -> Vec<OverlapNode> {
    columns
        .iter()
        .map(|(column, terms)| OverlapNode {
            id: u64::from(column),
            elements: terms.terms.clone(),
            sizes: None,
            weights: weights.map(|w| w.column_weights(terms)),
            self_overlap: None,
        })
        .collect()
}
