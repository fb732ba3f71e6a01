//! Sorted merge of term streams.
//!
//! Both the buffer flush of the builder and the merge of two finished term
//! files reduce to the same linear merge-join keyed by term value.

use std::{cmp::Ordering, io::Write, iter::Peekable, path::Path};

use colprof_common::{
    Result,
    error::{Error, ErrorKind},
    fs::AtomicFile,
};

use crate::{reader::TermIndexReader, record::TermEntry};

/// Merges two value-sorted term streams into `emit`, in value order.
///
/// Entries with equal values are combined into one: their column lists are
/// unioned, a column present on both sides must agree on its count, and the
/// type label of the left entry is kept. Each input must be strictly
/// increasing by value; an out-of-order input fails with `InvalidFormat`.
///
/// Returns the number of entries emitted.
pub fn merge_sorted<L, R, F>(left: L, right: R, mut emit: F) -> Result<u64>
where
    L: Iterator<Item = Result<TermEntry>>,
    R: Iterator<Item = Result<TermEntry>>,
    F: FnMut(TermEntry) -> Result<()>,
{
    let mut left = SortedInput::new("left", left);
    let mut right = SortedInput::new("right", right);
    let mut emitted = 0;
    loop {
        let order = match (left.peek()?, right.peek()?) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(l), Some(r)) => l.value.as_str().cmp(r.value.as_str()),
        };
        let entry = match order {
            Ordering::Less => left.take()?,
            Ordering::Greater => right.take()?,
            Ordering::Equal => {
                let mut l = left.take()?;
                let r = right.take()?;
                l.columns = l.columns.union_exact(&r.columns).map_err(|e| {
                    Error::invariant_violation(format!("merging term '{}': {e}", l.value))
                })?;
                l
            }
        };
        emit(entry)?;
        emitted += 1;
    }
    Ok(emitted)
}

/// A merge input that checks the strict value order of its entries.
struct SortedInput<I: Iterator<Item = Result<TermEntry>>> {
    name: &'static str,
    inner: Peekable<I>,
    last: Option<String>,
}

impl<I: Iterator<Item = Result<TermEntry>>> SortedInput<I> {
    fn new(name: &'static str, inner: I) -> Self {
        SortedInput {
            name,
            inner: inner.peekable(),
            last: None,
        }
    }

    fn peek(&mut self) -> Result<Option<&TermEntry>> {
        if let Some(Err(_)) = self.inner.peek() {
            return match self.inner.next() {
                Some(Err(e)) => Err(e),
                _ => Err(Error::invalid_operation("re-read of a failed merge input")),
            };
        }
        Ok(self.inner.peek().and_then(|item| item.as_ref().ok()))
    }

    fn take(&mut self) -> Result<TermEntry> {
        let entry = match self.inner.next() {
            Some(entry) => entry?,
            None => return Err(Error::invalid_operation("take from exhausted merge input")),
        };
        if let Some(last) = &self.last {
            if last.as_str() >= entry.value.as_str() {
                return Err(Error::invalid_format(
                    self.name,
                    format!(
                        "terms out of order: '{}' follows '{}'",
                        entry.value, last
                    ),
                ));
            }
        }
        self.last = Some(entry.value.clone());
        Ok(entry)
    }
}

/// Summary of a term-file merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub terms: u64,
}

/// Merges two finished term-index files into `output`.
///
/// Terms are matched by value and renumbered `0..N-1` in value order. Merging
/// a file with itself reproduces it byte for byte. The output is written to a
/// temporary file and moved into place only when the merge succeeds.
pub fn merge_term_files(left: &Path, right: &Path, output: &Path) -> Result<MergeSummary> {
    let left_terms = TermIndexReader::open(left)?.map(|r| r.map(|t| t.into_entry()));
    let right_terms = TermIndexReader::open(right)?.map(|r| r.map(|t| t.into_entry()));

    let mut out = AtomicFile::create(output)?;
    let context = || format!("write {}", output.display());
    let mut next_id = 0;
    let terms = merge_sorted(left_terms, right_terms, |entry| {
        let record = entry.with_id(next_id);
        next_id += 1;
        record
            .write_line(&mut out)
            .map_err(|e| Error::io(context(), e))
    })
    .map_err(|e| {
        if let ErrorKind::InvalidFormat { message, .. } = e.kind() {
            return Error::invalid_format(
                format!("{} + {}", left.display(), right.display()),
                message.clone(),
            );
        }
        e
    })?;
    out.commit()?;
    log::info!(
        "merged {} and {} into {} ({terms} terms)",
        left.display(),
        right.display(),
        output.display()
    );
    Ok(MergeSummary { terms })
}

#[cfg(test)]
mod tests {
    use colprof_common::{ColumnFrequencies, Result, error::ErrorKind};

    use super::merge_sorted;
    use crate::{data_type::DataType, record::TermEntry};

    fn entry(value: &str, columns: &[(u32, u64)]) -> Result<TermEntry> {
        Ok(TermEntry {
            value: value.to_string(),
            data_type: DataType::detect(value),
            columns: ColumnFrequencies::from_pairs(columns.iter().copied()).unwrap(),
        })
    }

    fn merge(left: Vec<Result<TermEntry>>, right: Vec<Result<TermEntry>>) -> Result<Vec<String>> {
        let mut out = Vec::new();
        merge_sorted(left.into_iter(), right.into_iter(), |e| {
            out.push(format!("{}={}", e.value, e.columns));
            Ok(())
        })?;
        Ok(out)
    }

    #[test]
    fn test_merge_interleaves_and_unions() {
        let left = vec![entry("a", &[(1, 1)]), entry("c", &[(1, 2)])];
        let right = vec![
            entry("b", &[(2, 1)]),
            entry("c", &[(2, 5)]),
            entry("d", &[(2, 1)]),
        ];
        assert_eq!(
            merge(left, right).unwrap(),
            ["a=1:1", "b=2:1", "c=1:2,2:5", "d=2:1"]
        );
    }

    #[test]
    fn test_merge_with_itself_is_identity() {
        let side = || vec![entry("x", &[(1, 3), (4, 1)]), entry("y", &[(2, 2)])];
        assert_eq!(merge(side(), side()).unwrap(), ["x=1:3,4:1", "y=2:2"]);
    }

    #[test]
    fn test_conflicting_counts() {
        let err = merge(vec![entry("x", &[(1, 3)])], vec![entry("x", &[(1, 4)])]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvariantViolation { .. }));
    }

    #[test]
    fn test_unsorted_input() {
        let err = merge(
            vec![entry("b", &[(1, 1)]), entry("a", &[(1, 1)])],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }
}
