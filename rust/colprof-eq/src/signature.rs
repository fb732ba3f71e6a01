//! Grouping keys of equivalence classes.

use colprof_common::{ColumnFrequencies, ColumnId, Result};

/// The grouping key of a term or class.
///
/// Two terms fall into the same class iff their signatures are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    /// The set of column ids, ignoring counts.
    ColumnSet(Box<[ColumnId]>),
    /// The exact `(column id, count)` list.
    Frequencies(Box<[(ColumnId, u64)]>),
}

impl Signature {
    /// Computes the signature of a column-frequency list.
    ///
    /// An empty list has no meaningful signature and is rejected with
    /// `InvariantViolation`.
    pub fn of(columns: &ColumnFrequencies, observe_frequencies: bool) -> Result<Signature> {
        if columns.is_empty() {
            colprof_common::invariant_violation!("cannot compute the signature of an empty column list");
        }
        Ok(if observe_frequencies {
            Signature::Frequencies(columns.as_slice().into())
        } else {
            Signature::ColumnSet(columns.columns().collect())
        })
    }

    /// Smallest column id of the signature, used to partition signatures.
    pub fn smallest_column(&self) -> ColumnId {
        match self {
            Signature::ColumnSet(columns) => columns[0],
            Signature::Frequencies(pairs) => pairs[0].0,
        }
    }

    pub fn column_count(&self) -> usize {
        match self {
            Signature::ColumnSet(columns) => columns.len(),
            Signature::Frequencies(pairs) => pairs.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use colprof_common::{ColumnFrequencies, error::ErrorKind};

    use super::Signature;

    fn columns(text: &str) -> ColumnFrequencies {
        ColumnFrequencies::parse(text, &"test").unwrap()
    }

    #[test]
    fn test_column_set_ignores_counts() {
        let a = Signature::of(&columns("1:2,5:1"), false).unwrap();
        let b = Signature::of(&columns("5:7,1:1"), false).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.smallest_column(), 1);
        assert_eq!(a.column_count(), 2);
        assert_ne!(a, Signature::of(&columns("1:2"), false).unwrap());
    }

    #[test]
    fn test_frequencies_distinguish_counts() {
        let a = Signature::of(&columns("1:2,5:1"), true).unwrap();
        let b = Signature::of(&columns("1:1,5:1"), true).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, Signature::of(&columns("5:1,1:2"), true).unwrap());
    }

    #[test]
    fn test_empty_columns_rejected() {
        let err = Signature::of(&ColumnFrequencies::new(), false).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvariantViolation { .. }));
    }
}
