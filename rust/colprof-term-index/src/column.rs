//! Column value files.
//!
//! A column file holds the values of one column, either as a plain list with
//! one value per line or as `value<TAB>count` rows. The column id is encoded in
//! the file name.

use std::{
    borrow::Cow,
    io::BufRead,
    path::{Path, PathBuf},
};

use colprof_common::{ColumnId, Result, error::Error, fs::open_reader};

const COLUMN_FILE_SUFFIXES: [&str; 4] = [".txt", ".txt.gz", ".tsv", ".tsv.gz"];

/// A column value file together with the column id parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFile {
    pub id: ColumnId,
    pub path: PathBuf,
}

impl ColumnFile {
    /// Recognizes a column file by name.
    ///
    /// The column id is the first dot-separated token of the file name when
    /// that token is numeric (`17.txt`), otherwise the third token
    /// (`dataset.table.17.txt.gz`). Returns `None` for files that are not
    /// column files or carry no id.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<ColumnFile> {
        let path = path.into();
        let name = path.file_name()?.to_str()?;
        if !COLUMN_FILE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            return None;
        }
        let tokens = name.split('.').collect::<Vec<_>>();
        let id = match tokens[0].parse::<ColumnId>() {
            Ok(id) => id,
            Err(_) => tokens.get(2)?.parse::<ColumnId>().ok()?,
        };
        Some(ColumnFile { id, path })
    }

    /// Opens the file and returns its `(value, count)` stream.
    pub fn values(&self) -> Result<ColumnValues> {
        ColumnValues::open(&self.path)
    }
}

/// Lists the column files of a directory, ordered by file name.
///
/// Files that look like column files but carry no parsable column id are
/// skipped with a warning.
pub fn list_column_files(dir: &Path) -> Result<Vec<ColumnFile>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::io(format!("list column directory {}", dir.display()), e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| Error::io(format!("list column directory {}", dir.display()), e))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let is_candidate = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| COLUMN_FILE_SUFFIXES.iter().any(|s| name.ends_with(s)));
        match ColumnFile::from_path(&path) {
            Some(file) => files.push(file),
            None if is_candidate => {
                log::warn!("skipping {}: no column id in file name", path.display());
            }
            None => {}
        }
    }
    Ok(files)
}

/// Trims a raw value and folds embedded tabs and line breaks into spaces.
///
/// Returns `None` for values that are empty after trimming.
pub fn normalize_value(raw: &str) -> Option<Cow<'_, str>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains(['\t', '\r', '\n']) {
        Some(Cow::Owned(trimmed.replace(['\t', '\r', '\n'], " ")))
    } else {
        Some(Cow::Borrowed(trimmed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowFormat {
    /// One value per line, each occurrence counted once.
    Values,
    /// `value<TAB>count` rows.
    Counted,
}

/// The `(value, count)` stream of one column file.
///
/// The row format is detected from the first non-empty line. A row that does
/// not match the detected format is yielded as an `InvalidFormat` error; the
/// term-index builder treats that as a malformed column and skips it.
pub struct ColumnValues {
    path: PathBuf,
    reader: Box<dyn BufRead + Send>,
    format: Option<RowFormat>,
    line_no: usize,
    buf: String,
}

impl ColumnValues {
    pub fn open(path: &Path) -> Result<ColumnValues> {
        Ok(ColumnValues {
            path: path.to_path_buf(),
            reader: open_reader(path)?,
            format: None,
            line_no: 0,
            buf: String::new(),
        })
    }

    fn detect_format(line: &str) -> RowFormat {
        match line.split_once('\t') {
            Some((_, count)) if !count.contains('\t') && count.trim().parse::<u64>().is_ok() => {
                RowFormat::Counted
            }
            _ => RowFormat::Values,
        }
    }

    fn parse_row(
        path: &Path,
        line_no: usize,
        format: RowFormat,
        line: &str,
    ) -> Result<(String, u64)> {
        let location = || format!("{}:{}", path.display(), line_no);
        match format {
            RowFormat::Values => {
                if line.contains('\t') {
                    return Err(Error::invalid_format(
                        location(),
                        "tab-separated row in a single-value column file",
                    ));
                }
                Ok((line.to_string(), 1))
            }
            RowFormat::Counted => {
                let mut fields = line.split('\t');
                let (Some(value), Some(count), None) = (fields.next(), fields.next(), fields.next())
                else {
                    return Err(Error::invalid_format(
                        location(),
                        "expected value<TAB>count",
                    ));
                };
                let count = count
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| Error::invalid_format(location(), format!("bad count '{count}'")))?;
                Ok((value.to_string(), count))
            }
        }
    }
}

impl Iterator for ColumnValues {
    type Item = Result<(String, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            let read = colprof_common::try_or_ret_some_err!(
                self.reader
                    .read_line(&mut self.buf)
                    .map_err(|e| Error::io(format!("read {}", self.path.display()), e))
            );
            if read == 0 {
                return None;
            }
            self.line_no += 1;
            let line = self.buf.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }
            let format = *self
                .format
                .get_or_insert_with(|| ColumnValues::detect_format(line));
            return Some(ColumnValues::parse_row(
                &self.path,
                self.line_no,
                format,
                line,
            ));
        }
    }
}
