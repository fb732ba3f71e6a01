use std::path::Path;

use ahash::AHashSet;
use colprof_common::{ColumnId, Result, error::Error, fs::AtomicFile};

use crate::reader::TermIndexReader;

/// Counters reported by [`filter_columns`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub terms_read: u64,
    pub terms_written: u64,
}

/// Restricts a term index to a subset of columns.
///
/// Every term keeps only the listed columns; terms left without any column are
/// dropped. Term ids are preserved, so the output stays joinable with class
/// files built from the input.
pub fn filter_columns(
    input: &Path,
    columns: &AHashSet<ColumnId>,
    output: &Path,
) -> Result<FilterSummary> {
    let mut out = AtomicFile::create(output)?;
    let mut summary = FilterSummary::default();
    for record in TermIndexReader::open(input)? {
        let mut record = record?;
        summary.terms_read += 1;
        record.columns.retain_columns(|column| columns.contains(&column));
        if record.columns.is_empty() {
            continue;
        }
        record
            .write_line(&mut out)
            .map_err(|e| Error::io(format!("write {}", output.display()), e))?;
        summary.terms_written += 1;
    }
    out.commit()?;
    log::info!(
        "kept {} of {} terms for {} columns",
        summary.terms_written,
        summary.terms_read,
        columns.len()
    );
    Ok(summary)
}

/// Reads a column list file: one column id per line, or `id<TAB>...` rows.
pub fn read_column_list(path: &Path) -> Result<AHashSet<ColumnId>> {
    colprof_common::records::LineRecords::open(path, |line, location| {
        let id = line.split('\t').next().unwrap_or_default().trim();
        id.parse::<ColumnId>().map_err(|_| {
            Error::invalid_format(location.to_string(), format!("bad column id '{id}'"))
        })
    })?
    .collect()
}
