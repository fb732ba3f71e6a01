//! Lazy, single-pass record streams over tab-separated index files.

use std::{
    io::BufRead,
    path::{Path, PathBuf},
};

use crate::{
    Result,
    error::Error,
    fs::{LineLocation, open_reader},
};

type ParseFn<T> = Box<dyn FnMut(&str, LineLocation<'_>) -> Result<T> + Send>;

/// Iterator over the parsed records of a line-oriented file.
///
/// Blank lines are skipped. A read failure or a malformed line is yielded as
/// an error naming the file (and line), after which iteration may continue
/// with the following line.
pub struct LineRecords<T> {
    path: PathBuf,
    reader: Box<dyn BufRead + Send>,
    line_no: usize,
    buf: String,
    parse: ParseFn<T>,
}

impl<T> LineRecords<T> {
    pub fn open<F>(path: impl AsRef<Path>, parse: F) -> Result<LineRecords<T>>
    where
        F: FnMut(&str, LineLocation<'_>) -> Result<T> + Send + 'static,
    {
        let path = path.as_ref().to_path_buf();
        let reader = open_reader(&path)?;
        Ok(LineRecords {
            path,
            reader,
            line_no: 0,
            buf: String::new(),
            parse: Box::new(parse),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Iterator for LineRecords<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            let read = crate::try_or_ret_some_err!(
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
            let location = LineLocation {
                path: &self.path,
                line: self.line_no,
            };
            return Some((self.parse)(line, location));
        }
    }
}

/// Splits a record line into exactly `N` tab-separated fields.
pub fn split_fields<'a, const N: usize>(
    line: &'a str,
    location: LineLocation<'_>,
) -> Result<[&'a str; N]> {
    let mut fields = [""; N];
    let mut count = 0;
    for field in line.split('\t') {
        if count < N {
            fields[count] = field;
        }
        count += 1;
    }
    if count != N {
        return Err(Error::invalid_format(
            location.to_string(),
            format!("expected {N} tab-separated fields, found {count}"),
        ));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{LineRecords, split_fields};
    use crate::{error::ErrorKind, fs::LineLocation};

    #[test]
    fn test_line_records_skip_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        std::fs::write(&path, "1\n\n2\r\n3\n").unwrap();
        let records = LineRecords::open(&path, |line, location| {
            line.parse::<u64>()
                .map(|value| (location.line, value))
                .map_err(|_| crate::error::Error::invalid_format(location.to_string(), line))
        })
        .unwrap()
        .collect::<crate::Result<Vec<_>>>()
        .unwrap();
        assert_eq!(records, [(1, 1), (3, 2), (4, 3)]);
    }

    #[test]
    fn test_split_fields() {
        let location = LineLocation {
            path: Path::new("classes.txt"),
            line: 5,
        };
        assert_eq!(split_fields::<3>("1\t2,3\t4:1", location).unwrap(), ["1", "2,3", "4:1"]);
        let err = split_fields::<3>("1\t2", location).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidFormat { element, message } => {
                assert_eq!(element, "classes.txt:5");
                assert!(message.contains("found 2"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
