//! # Term Index Builder
//!
//! This module aggregates many column value streams into a single term index:
//! one line per distinct value, listing every column the value occurs in and
//! how often.
//!
//! ## Architecture
//!
//! - **Column scan**: each column is first aggregated into a private map. The
//!   column acceptance constraint is evaluated only after the whole column has
//!   been read, and a rejected or malformed column leaves no trace in the index.
//!
//! - **Buffer**: accepted columns are folded into an in-memory map from value
//!   to column counts. When the map holds more than `buffer_size` distinct
//!   terms it is sorted and merged with the sorted run on disk, which bounds
//!   memory by the buffer size rather than the corpus size.
//!
//! - **Sorted run**: a scratch file next to the output holding the terms merged
//!   so far, without ids, ordered by value. Every flush writes a fresh run and
//!   drops the previous one.
//!
//! - **Finalization**: `finish()` flushes the buffer one last time and
//!   rewrites the run with sequential ids `0..N-1` in value order, into a
//!   temporary file that atomically replaces the output path. Ids therefore
//!   depend only on the set of values, not on the order columns arrived in.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use ahash::{AHashMap, AHashSet};
use colprof_common::{
    ColumnFrequencies, ColumnId, Result,
    error::Error,
    fs::{AtomicFile, parent_dir},
};
use tempfile::TempPath;

use crate::{
    column::{ColumnFile, normalize_value},
    constraint::ColumnConstraint,
    data_type::DataType,
    merge::merge_sorted,
    reader::read_run,
    record::TermEntry,
};

/// Configuration parameters for building a term index.
#[derive(Debug, Clone)]
pub struct TermIndexBuilderConfig {
    /// Maximum number of distinct terms held in memory. The buffer is merged
    /// into the sorted run on disk once it grows beyond this size.
    pub buffer_size: usize,

    /// Acceptance constraint evaluated for every scanned column.
    pub constraint: ColumnConstraint,

    /// Whether raw values are trimmed and stripped of tabs and line breaks
    /// before aggregation. Without normalization, a column holding a value
    /// with a tab or line break is skipped as malformed.
    pub normalize: bool,
}

impl Default for TermIndexBuilderConfig {
    fn default() -> Self {
        TermIndexBuilderConfig {
            buffer_size: TermIndexBuilder::DEFAULT_BUFFER_SIZE,
            constraint: ColumnConstraint::None,
            normalize: true,
        }
    }
}

/// What happened to a column passed to [`TermIndexBuilder::ingest_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOutcome {
    /// The column's terms were folded into the index.
    Accepted { terms: usize },
    /// The column was scanned but failed the acceptance constraint.
    Rejected,
    /// The column stream failed mid-read and the column was dropped.
    Skipped,
}

/// Counters reported by [`TermIndexBuilder::finish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermIndexSummary {
    pub columns_accepted: usize,
    pub columns_rejected: usize,
    pub columns_skipped: usize,
    pub flushes: usize,
    pub terms: u64,
}

struct BufferedTerm {
    data_type: DataType,
    columns: ColumnFrequencies,
}

/// Incrementally aggregates column value streams into a sorted term index.
///
/// The builder is strictly sequential: columns are ingested one at a time and
/// the result is only complete after [`finish`](Self::finish).
pub struct TermIndexBuilder {
    config: TermIndexBuilderConfig,
    /// Destination of the finished index.
    output: PathBuf,
    /// Directory holding the sorted run, next to the output.
    scratch_dir: PathBuf,
    /// Terms of the columns accepted since the last flush.
    buffer: AHashMap<String, BufferedTerm>,
    /// Sorted run holding everything flushed so far.
    run: Option<TempPath>,
    /// Columns committed to the index, used to reject a second ingestion.
    columns: AHashSet<ColumnId>,
    summary: TermIndexSummary,
}

impl TermIndexBuilder {
    pub const DEFAULT_BUFFER_SIZE: usize = 10_000_000;

    /// Creates a builder that will write the finished index to `output`.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` if the buffer size is zero.
    pub fn new(config: TermIndexBuilderConfig, output: impl Into<PathBuf>) -> Result<Self> {
        colprof_common::verify_arg!(buffer_size, config.buffer_size > 0);
        let output = output.into();
        let scratch_dir = parent_dir(&output).to_path_buf();
        Ok(TermIndexBuilder {
            config,
            output,
            scratch_dir,
            buffer: AHashMap::new(),
            run: None,
            columns: AHashSet::new(),
            summary: TermIndexSummary::default(),
        })
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Number of distinct terms currently held in memory.
    pub fn buffered_terms(&self) -> usize {
        self.buffer.len()
    }

    /// Scans one column and folds its terms into the index.
    ///
    /// The column is aggregated into a private value→count map first. If the
    /// stream yields an error part way, the column is dropped with a warning
    /// and the index is left exactly as it was. If the scanned column fails the
    /// configured constraint its terms are discarded as a whole. Otherwise each
    /// term is added to the buffer, creating an entry with its detected type on
    /// first sight, and the buffer is flushed if it outgrew its budget.
    ///
    /// # Arguments
    ///
    /// * `column` - Id of the column; every column may be ingested only once.
    /// * `values` - The column's `(raw value, count)` stream. Normalized values
    ///   that coincide have their counts summed.
    ///
    /// # Errors
    ///
    /// - `InvariantViolation` if the column was already ingested.
    /// - `Io` if the buffer flush fails; the run is then unusable and the
    ///   whole build should be abandoned.
    pub fn ingest_column<I>(&mut self, column: ColumnId, values: I) -> Result<ColumnOutcome>
    where
        I: IntoIterator<Item = Result<(String, u64)>>,
    {
        if self.columns.contains(&column) {
            colprof_common::invariant_violation!("column {column} was already added to the index");
        }

        let mut local: AHashMap<String, (DataType, u64)> = AHashMap::new();
        let mut evaluator = self.config.constraint.evaluator();
        for item in values {
            let (raw, count) = match item {
                Ok(row) => row,
                Err(e) => {
                    log::warn!("skipping column {column}: {e}");
                    self.summary.columns_skipped += 1;
                    return Ok(ColumnOutcome::Skipped);
                }
            };
            if count == 0 {
                continue;
            }
            let value = if self.config.normalize {
                match normalize_value(&raw) {
                    Some(value) => value.into_owned(),
                    None => continue,
                }
            } else if raw.is_empty() {
                continue;
            } else if raw.contains(['\t', '\n', '\r']) {
                log::warn!(
                    "skipping column {column}: raw value {raw:?} contains a field or line separator"
                );
                self.summary.columns_skipped += 1;
                return Ok(ColumnOutcome::Skipped);
            } else {
                raw
            };
            match local.get_mut(&value) {
                Some((_, total)) => *total += count,
                None => {
                    let data_type = DataType::detect(&value);
                    evaluator.consume(data_type);
                    local.insert(value, (data_type, count));
                }
            }
        }

        if !evaluator.is_satisfied() {
            log::info!(
                "column {column} rejected by constraint {} ({} distinct values)",
                self.config.constraint,
                local.len()
            );
            self.summary.columns_rejected += 1;
            return Ok(ColumnOutcome::Rejected);
        }

        let terms = local.len();
        for (value, (data_type, count)) in local {
            let term = self.buffer.entry(value).or_insert_with(|| BufferedTerm {
                data_type,
                columns: ColumnFrequencies::new(),
            });
            term.columns.insert(column, count)?;
        }
        self.columns.insert(column);
        self.summary.columns_accepted += 1;
        log::debug!("column {column}: {terms} distinct terms");

        self.flush_if_over_budget()?;
        Ok(ColumnOutcome::Accepted { terms })
    }

    /// Reads a column file and ingests it.
    ///
    /// A file that cannot be opened is treated like a malformed column: it is
    /// skipped with a warning.
    pub fn ingest_file(&mut self, file: &ColumnFile) -> Result<ColumnOutcome> {
        match file.values() {
            Ok(values) => self.ingest_column(file.id, values),
            Err(e) => {
                log::warn!("skipping column file {}: {e}", file.path.display());
                self.summary.columns_skipped += 1;
                Ok(ColumnOutcome::Skipped)
            }
        }
    }

    /// Flushes the buffer if it holds more than `buffer_size` terms.
    ///
    /// Returns `true` if a flush happened.
    pub fn flush_if_over_budget(&mut self) -> Result<bool> {
        if self.buffer.len() > self.config.buffer_size {
            self.flush()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Sorts the buffer and merges it with the sorted run on disk.
    ///
    /// The merged stream is written to a new scratch file, which replaces the
    /// previous run only after it has been written completely.
    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let mut entries = std::mem::take(&mut self.buffer)
            .into_iter()
            .map(|(value, term)| TermEntry {
                value,
                data_type: term.data_type,
                columns: term.columns,
            })
            .collect::<Vec<_>>();
        entries.sort_unstable_by(|a, b| a.value.cmp(&b.value));
        let buffered = entries.len();

        let temp = tempfile::Builder::new()
            .prefix(".colprof-run-")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| {
                Error::io(
                    format!("create sorted run in {}", self.scratch_dir.display()),
                    e,
                )
            })?;
        let run_path = temp.into_temp_path();
        let context = || format!("write sorted run {}", run_path.display());
        let file = File::create(&run_path).map_err(|e| Error::io(context(), e))?;
        let mut writer = BufWriter::new(file);

        let written = match &self.run {
            Some(previous) => merge_sorted(
                read_run(previous)?,
                entries.into_iter().map(Ok),
                |entry| entry.write_line(&mut writer).map_err(|e| Error::io(context(), e)),
            )?,
            None => {
                for entry in &entries {
                    entry
                        .write_line(&mut writer)
                        .map_err(|e| Error::io(context(), e))?;
                }
                entries.len() as u64
            }
        };
        writer.flush().map_err(|e| Error::io(context(), e))?;

        self.run = Some(run_path);
        self.summary.flushes += 1;
        log::info!(
            "flushed {buffered} buffered terms, sorted run now holds {written} terms"
        );
        Ok(())
    }

    /// Completes the build and writes the finished index.
    ///
    /// Flushes the remaining buffer, then numbers the terms of the sorted run
    /// `0..N-1` in value order and writes `id<TAB>value<TAB>type<TAB>columns`
    /// lines. The output only appears at its path once fully written; with no
    /// accepted terms it is an empty file.
    ///
    /// # Errors
    ///
    /// Any I/O failure aborts the build and leaves an existing file at the
    /// output path untouched.
    pub fn finish(mut self) -> Result<TermIndexSummary> {
        self.flush()?;
        let mut out = AtomicFile::create(&self.output)?;
        let context = || format!("write {}", self.output.display());
        let mut terms = 0;
        if let Some(run) = &self.run {
            for entry in read_run(run)? {
                entry?
                    .with_id(terms)
                    .write_line(&mut out)
                    .map_err(|e| Error::io(context(), e))?;
                terms += 1;
            }
        }
        out.commit()?;
        self.summary.terms = terms;
        log::info!(
            "term index {} written: {terms} terms from {} columns",
            self.output.display(),
            self.summary.columns_accepted
        );
        Ok(self.summary)
    }
}

/// Builds a term index from column files in the given order.
pub fn build_term_index(
    files: &[ColumnFile],
    config: TermIndexBuilderConfig,
    output: &Path,
) -> Result<TermIndexSummary> {
    let mut builder = TermIndexBuilder::new(config, output)?;
    for file in files {
        builder.ingest_file(file)?;
    }
    builder.finish()
}
