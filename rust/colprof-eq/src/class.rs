//! Equivalence classes and the class file format.
//!
//! A class file holds one `id<TAB>term,term,...<TAB>col:count,...` line per
//! class, with term ids ascending.

use std::{collections::BTreeSet, io::Write, path::Path};

use colprof_common::{
    ClassId, ColumnFrequencies, Result, TermId, error::Error, fs::LineLocation,
    records::{LineRecords, split_fields},
};
use itertools::Itertools;

/// Selects how class lines are materialized when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassFormat {
    /// Keep the member term ids.
    #[default]
    Full,
    /// Keep only the number of member terms.
    Summary,
}

/// A frozen equivalence class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquivalenceClass {
    Full {
        id: ClassId,
        terms: Vec<TermId>,
        columns: ColumnFrequencies,
    },
    /// A class read without its member list.
    Summary {
        id: ClassId,
        term_count: usize,
        columns: ColumnFrequencies,
    },
}

impl EquivalenceClass {
    pub fn id(&self) -> ClassId {
        match self {
            EquivalenceClass::Full { id, .. } | EquivalenceClass::Summary { id, .. } => *id,
        }
    }

    pub fn term_count(&self) -> usize {
        match self {
            EquivalenceClass::Full { terms, .. } => terms.len(),
            EquivalenceClass::Summary { term_count, .. } => *term_count,
        }
    }

    /// Summed column counts of all member terms.
    pub fn columns(&self) -> &ColumnFrequencies {
        match self {
            EquivalenceClass::Full { columns, .. } | EquivalenceClass::Summary { columns, .. } => {
                columns
            }
        }
    }

    /// The member term ids, ascending.
    ///
    /// Fails with `UnsupportedOperation` for a class read as a summary.
    pub fn terms(&self) -> Result<&[TermId]> {
        match self {
            EquivalenceClass::Full { terms, .. } => Ok(terms),
            EquivalenceClass::Summary { id, .. } => Err(Error::unsupported_operation(format!(
                "term list of summary class {id}"
            ))),
        }
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, EquivalenceClass::Summary { .. })
    }

    /// Parses one class line in the requested format.
    pub fn parse(line: &str, format: ClassFormat, location: LineLocation<'_>) -> Result<Self> {
        let [id, terms, columns] = split_fields::<3>(line, location)?;
        let id = id.parse::<ClassId>().map_err(|_| {
            Error::invalid_format(location.to_string(), format!("bad class id '{id}'"))
        })?;
        let columns = ColumnFrequencies::parse(columns, &location)?;
        if columns.is_empty() {
            return Err(Error::invalid_format(
                location.to_string(),
                format!("class {id} has no columns"),
            ));
        }
        let terms = terms.trim();
        match format {
            ClassFormat::Full => {
                let terms = if terms.is_empty() {
                    Vec::new()
                } else {
                    terms
                        .split(',')
                        .map(|t| t.trim().parse::<TermId>())
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .map_err(|_| {
                            Error::invalid_format(
                                location.to_string(),
                                format!("bad term list of class {id}"),
                            )
                        })?
                };
                if !terms.is_sorted() {
                    return Err(Error::invalid_format(
                        location.to_string(),
                        format!("term list of class {id} is not sorted"),
                    ));
                }
                Ok(EquivalenceClass::Full { id, terms, columns })
            }
            ClassFormat::Summary => {
                let term_count = if terms.is_empty() {
                    0
                } else {
                    terms.bytes().filter(|&b| b == b',').count() + 1
                };
                Ok(EquivalenceClass::Summary {
                    id,
                    term_count,
                    columns,
                })
            }
        }
    }

    /// Writes the class line to `writer`, the file at `path`.
    ///
    /// A summary class has no term list to write and fails with
    /// `UnsupportedOperation`. Write failures name `path`.
    pub fn write_line(&self, writer: &mut impl Write, path: &Path) -> Result<()> {
        let EquivalenceClass::Full { id, terms, columns } = self else {
            return Err(Error::unsupported_operation(format!(
                "write summary class {}",
                self.id()
            )));
        };
        writeln!(writer, "{id}\t{}\t{columns}", terms.iter().join(","))
            .map_err(|e| Error::io(format!("write {}", path.display()), e))
    }
}

/// Lazy reader over a class file.
pub fn read_classes(
    path: impl AsRef<Path>,
    format: ClassFormat,
) -> Result<LineRecords<EquivalenceClass>> {
    LineRecords::open(path, move |line, location| {
        EquivalenceClass::parse(line, format, location)
    })
}

/// A class under construction.
///
/// Terms are added one by one; their column counts are summed into the
/// class totals. Adding a term that is already a member has no effect.
#[derive(Debug, Clone, Default)]
pub struct ClassBuilder {
    terms: BTreeSet<TermId>,
    columns: ColumnFrequencies,
}

impl ClassBuilder {
    pub fn new() -> ClassBuilder {
        ClassBuilder::default()
    }

    /// Adds a term, returning `false` if it was already a member.
    pub fn add_term(&mut self, term: TermId, columns: &ColumnFrequencies) -> bool {
        if !self.terms.insert(term) {
            return false;
        }
        self.columns.accumulate(columns);
        true
    }

    /// Folds another class into this one, term by term.
    pub fn absorb(&mut self, other: ClassBuilder) {
        for term in other.terms {
            self.terms.insert(term);
        }
        self.columns.accumulate(&other.columns);
    }

    pub fn contains(&self, term: TermId) -> bool {
        self.terms.contains(&term)
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> impl Iterator<Item = TermId> + '_ {
        self.terms.iter().copied()
    }

    pub fn columns(&self) -> &ColumnFrequencies {
        &self.columns
    }

    pub fn build(self, id: ClassId) -> EquivalenceClass {
        EquivalenceClass::Full {
            id,
            terms: self.terms.into_iter().collect(),
            columns: self.columns,
        }
    }
}

impl From<EquivalenceClass> for ClassBuilder {
    /// Reopens a class for further merging; a summary class contributes its
    /// column totals but no members.
    fn from(class: EquivalenceClass) -> ClassBuilder {
        match class {
            EquivalenceClass::Full { terms, columns, .. } => ClassBuilder {
                terms: terms.into_iter().collect(),
                columns,
            },
            EquivalenceClass::Summary { columns, .. } => ClassBuilder {
                terms: BTreeSet::new(),
                columns,
            },
        }
    }
}
