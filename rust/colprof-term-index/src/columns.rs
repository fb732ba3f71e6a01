//! The derived column view of a term index.

use std::collections::BTreeMap;

use colprof_common::{ColumnId, Result, TermId};

use crate::record::TermRecord;

/// The terms of one column with their occurrence counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTerms {
    /// Term ids, ascending.
    pub terms: Vec<TermId>,
    /// Occurrence count of each term in the column, parallel to `terms`.
    pub counts: Vec<u64>,
}

impl ColumnTerms {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Total number of occurrences (cells) in the column.
    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Columns of a term index, built by inverting the term column lists.
#[derive(Debug, Clone, Default)]
pub struct ColumnTermSets {
    columns: BTreeMap<ColumnId, ColumnTerms>,
}

impl ColumnTermSets {
    pub fn from_terms<I>(terms: I) -> Result<ColumnTermSets>
    where
        I: IntoIterator<Item = Result<TermRecord>>,
    {
        let mut columns: BTreeMap<ColumnId, ColumnTerms> = BTreeMap::new();
        let mut sorted = true;
        for term in terms {
            let term = term?;
            for (column, count) in term.columns.iter() {
                let entry = columns.entry(column).or_default();
                sorted &= entry.terms.last().is_none_or(|&last| last < term.id);
                entry.terms.push(term.id);
                entry.counts.push(count);
            }
        }
        if !sorted {
            for column in columns.values_mut() {
                let mut pairs = column
                    .terms
                    .iter()
                    .copied()
                    .zip(column.counts.iter().copied())
                    .collect::<Vec<_>>();
                pairs.sort_unstable_by_key(|&(term, _)| term);
                (column.terms, column.counts) = pairs.into_iter().unzip();
            }
        }
        Ok(ColumnTermSets { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, column: ColumnId) -> Option<&ColumnTerms> {
        self.columns.get(&column)
    }

    /// Columns in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &ColumnTerms)> {
        self.columns.iter().map(|(&id, terms)| (id, terms))
    }
}
