//! Column-frequency lists: the `col:count,col:count,...` payload attached to
//! every term and every equivalence class.

use std::fmt;

use itertools::{EitherOrBoth, Itertools};

use crate::{Result, error::Error};

/// Identifier of a source column.
pub type ColumnId = u32;

/// A mapping from column id to the number of occurrences in that column.
///
/// Entries are kept sorted by column id with unique keys and strictly positive
/// counts, so equal lists always render to the same text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ColumnFrequencies {
    entries: Vec<(ColumnId, u64)>,
}

impl ColumnFrequencies {
    pub fn new() -> ColumnFrequencies {
        ColumnFrequencies::default()
    }

    /// Builds a list from arbitrary `(column, count)` pairs.
    ///
    /// Fails if a count is zero or a column id occurs more than once.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ColumnId, u64)>) -> Result<Self> {
        let mut entries = pairs.into_iter().collect::<Vec<_>>();
        entries.sort_unstable_by_key(|&(column, _)| column);
        if let Some(&(column, _)) = entries.iter().find(|&&(_, count)| count == 0) {
            return Err(Error::invariant_violation(format!(
                "zero count for column {column}"
            )));
        }
        if let Some(((column, _), _)) = entries.iter().tuple_windows().find(|(a, b)| a.0 == b.0) {
            return Err(Error::invariant_violation(format!(
                "column {column} listed more than once"
            )));
        }
        Ok(ColumnFrequencies { entries })
    }

    /// Parses the `col:count,col:count` text form.
    ///
    /// A bare column id without `:count` stands for a count of one. An empty
    /// string parses to an empty list. Errors are reported as `InvalidFormat`
    /// against `element`, usually a `file:line` location.
    pub fn parse(text: &str, element: &dyn fmt::Display) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(ColumnFrequencies::new());
        }
        let mut entries = Vec::with_capacity(text.len() / 4 + 1);
        for item in text.split(',') {
            let (column, count) = match item.split_once(':') {
                Some((column, count)) => (column, count),
                None => (item, "1"),
            };
            let column = column.trim().parse::<ColumnId>().map_err(|_| {
                Error::invalid_format(element.to_string(), format!("bad column id in '{item}'"))
            })?;
            let count = count.trim().parse::<u64>().map_err(|_| {
                Error::invalid_format(element.to_string(), format!("bad count in '{item}'"))
            })?;
            if count == 0 {
                return Err(Error::invalid_format(
                    element.to_string(),
                    format!("zero count for column {column}"),
                ));
            }
            entries.push((column, count));
        }
        entries.sort_unstable_by_key(|&(column, _)| column);
        if entries.iter().tuple_windows().any(|(a, b)| a.0 == b.0) {
            return Err(Error::invalid_format(
                element.to_string(),
                "duplicate column id in column list",
            ));
        }
        Ok(ColumnFrequencies { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (ColumnId, u64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn columns(&self) -> impl ExactSizeIterator<Item = ColumnId> + '_ {
        self.entries.iter().map(|&(column, _)| column)
    }

    pub fn as_slice(&self) -> &[(ColumnId, u64)] {
        &self.entries
    }

    pub fn get(&self, column: ColumnId) -> Option<u64> {
        self.entries
            .binary_search_by_key(&column, |&(c, _)| c)
            .ok()
            .map(|pos| self.entries[pos].1)
    }

    pub fn contains(&self, column: ColumnId) -> bool {
        self.get(column).is_some()
    }

    pub fn smallest_column(&self) -> Option<ColumnId> {
        self.entries.first().map(|&(column, _)| column)
    }

    /// Sum of all counts (the number of cells covered).
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|&(_, count)| count).sum()
    }

    /// Records the count of a column that is not yet present.
    ///
    /// A term observed twice for the same column means the caller folded one
    /// column twice, which is reported as an `InvariantViolation`.
    pub fn insert(&mut self, column: ColumnId, count: u64) -> Result<()> {
        if count == 0 {
            crate::invariant_violation!("zero count for column {column}");
        }
        match self.entries.binary_search_by_key(&column, |&(c, _)| c) {
            Ok(_) => crate::invariant_violation!("count for column {column} already exists"),
            Err(pos) => {
                self.entries.insert(pos, (column, count));
                Ok(())
            }
        }
    }

    /// Adds `other`'s counts into this list, summing counts per column.
    pub fn accumulate(&mut self, other: &ColumnFrequencies) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.entries.extend_from_slice(&other.entries);
            return;
        }
        self.entries = self
            .entries
            .iter()
            .merge_join_by(other.entries.iter(), |a, b| a.0.cmp(&b.0))
            .map(|pair| match pair {
                EitherOrBoth::Both(&(column, a), &(_, b)) => (column, a + b),
                EitherOrBoth::Left(&entry) | EitherOrBoth::Right(&entry) => entry,
            })
            .collect();
    }

    /// Unions two lists describing the same term.
    ///
    /// A column present on both sides must carry the same count there and is
    /// kept once; disagreeing counts mean two runs disagree about one column
    /// and fail with `InvariantViolation`.
    pub fn union_exact(&self, other: &ColumnFrequencies) -> Result<ColumnFrequencies> {
        let mut entries = Vec::with_capacity(self.len() + other.len());
        for pair in self
            .entries
            .iter()
            .merge_join_by(other.entries.iter(), |a, b| a.0.cmp(&b.0))
        {
            match pair {
                EitherOrBoth::Both(&(column, a), &(_, b)) => {
                    if a != b {
                        crate::invariant_violation!(
                            "conflicting counts {a} and {b} for column {column}"
                        );
                    }
                    entries.push((column, a));
                }
                EitherOrBoth::Left(&entry) | EitherOrBoth::Right(&entry) => entries.push(entry),
            }
        }
        Ok(ColumnFrequencies { entries })
    }

    /// Keeps only the columns accepted by `keep`.
    pub fn retain_columns(&mut self, mut keep: impl FnMut(ColumnId) -> bool) {
        self.entries.retain(|&(column, _)| keep(column));
    }
}

impl fmt::Display for ColumnFrequencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (column, count)) in self.entries.iter().enumerate() {
            if i != 0 {
                f.write_str(",")?;
            }
            write!(f, "{column}:{count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ColumnFrequencies;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_and_format() {
        let list = ColumnFrequencies::parse("7:2,3:1,12", &"t:1").unwrap();
        assert_eq!(list.to_string(), "3:1,7:2,12:1");
        assert_eq!(list.len(), 3);
        assert_eq!(list.total(), 4);
        assert_eq!(list.get(7), Some(2));
        assert_eq!(list.get(8), None);
        assert_eq!(list.smallest_column(), Some(3));
        assert!(ColumnFrequencies::parse("", &"t:1").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors_name_location() {
        for bad in ["1:x", "a:1", "1:0", "1:2,1:3"] {
            let err = ColumnFrequencies::parse(bad, &"terms.txt:9").unwrap_err();
            match err.kind() {
                ErrorKind::InvalidFormat { element, .. } => assert_eq!(element, "terms.txt:9"),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_insert_rejects_duplicate_column() {
        let mut list = ColumnFrequencies::new();
        list.insert(4, 1).unwrap();
        list.insert(2, 5).unwrap();
        assert_eq!(list.to_string(), "2:5,4:1");
        let err = list.insert(4, 1).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvariantViolation { .. }));
    }

    #[test]
    fn test_accumulate_sums_counts() {
        let mut a = ColumnFrequencies::from_pairs([(1, 2), (5, 1)]).unwrap();
        let b = ColumnFrequencies::from_pairs([(1, 3), (9, 4)]).unwrap();
        a.accumulate(&b);
        assert_eq!(a.to_string(), "1:5,5:1,9:4");
    }

    #[test]
    fn test_union_exact() {
        let a = ColumnFrequencies::from_pairs([(1, 2), (5, 1)]).unwrap();
        let b = ColumnFrequencies::from_pairs([(5, 1), (6, 3)]).unwrap();
        assert_eq!(a.union_exact(&b).unwrap().to_string(), "1:2,5:1,6:3");
        assert_eq!(a.union_exact(&a).unwrap(), a);

        let c = ColumnFrequencies::from_pairs([(5, 2)]).unwrap();
        let err = a.union_exact(&c).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvariantViolation { .. }));
    }

    #[test]
    fn test_from_pairs_rejects_duplicates() {
        assert!(ColumnFrequencies::from_pairs([(1, 1), (1, 2)]).is_err());
        assert!(ColumnFrequencies::from_pairs([(1, 0)]).is_err());
    }
}
