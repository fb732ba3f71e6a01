use std::path::Path;

use colprof_common::{Result, records::LineRecords};

use crate::record::{TermEntry, TermRecord};

/// Lazy, single-pass reader over a finished term-index file.
pub struct TermIndexReader {
    records: LineRecords<TermRecord>,
}

impl TermIndexReader {
    pub fn open(path: impl AsRef<Path>) -> Result<TermIndexReader> {
        Ok(TermIndexReader {
            records: LineRecords::open(path, TermRecord::parse)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.records.path()
    }
}

impl Iterator for TermIndexReader {
    type Item = Result<TermRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }
}

/// Reader over a sorted run: term lines without ids.
pub(crate) fn read_run(path: &Path) -> Result<LineRecords<TermEntry>> {
    LineRecords::open(path, TermEntry::parse)
}
