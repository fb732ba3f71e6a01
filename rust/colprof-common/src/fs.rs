//! File helpers shared by the index readers and writers.
//!
//! Every file whose name ends in `.gz` is transparently gzip-compressed on
//! both the read and the write side. Output files are written through
//! [`AtomicFile`], so a failed run never leaves a half-written index behind.

use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use flate2::{Compression, read::MultiGzDecoder, write::GzEncoder};
use tempfile::NamedTempFile;

use crate::{Result, error::Error};

const IO_BUFFER_SIZE: usize = 256 * 1024;

/// Returns `true` if the path names a gzip-compressed file.
pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Opens a file for buffered line reading, decompressing `.gz` files.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|e| Error::io(format!("open {}", path.display()), e))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::with_capacity(
            IO_BUFFER_SIZE,
            MultiGzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(IO_BUFFER_SIZE, file)))
    }
}

/// Returns the directory that temporary siblings of `path` should live in.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// A position in a line-oriented input file, used to name malformed records.
#[derive(Debug, Clone, Copy)]
pub struct LineLocation<'a> {
    pub path: &'a Path,
    pub line: usize,
}

impl fmt::Display for LineLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

enum Sink {
    Plain(BufWriter<NamedTempFile>),
    Gzip(GzEncoder<BufWriter<NamedTempFile>>),
}

/// An output file that only appears at its final path once committed.
///
/// Data goes to a temporary file created next to the destination. `commit`
/// flushes it and renames it over the destination in one step. Dropping an
/// uncommitted `AtomicFile` removes the temporary file and leaves any
/// previous file at the destination untouched.
pub struct AtomicFile {
    path: PathBuf,
    sink: Sink,
}

impl AtomicFile {
    pub fn create(path: impl Into<PathBuf>) -> Result<AtomicFile> {
        let path = path.into();
        let temp = tempfile::Builder::new()
            .prefix(".colprof-")
            .suffix(".partial")
            .tempfile_in(parent_dir(&path))
            .map_err(|e| Error::io(format!("create temporary file for {}", path.display()), e))?;
        let writer = BufWriter::with_capacity(IO_BUFFER_SIZE, temp);
        let sink = if is_gzip(&path) {
            Sink::Gzip(GzEncoder::new(writer, Compression::default()))
        } else {
            Sink::Plain(writer)
        };
        Ok(AtomicFile { path, sink })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes all data and moves the file into place.
    pub fn commit(self) -> Result<()> {
        let context = || format!("write {}", self.path.display());
        let writer = match self.sink {
            Sink::Plain(writer) => writer,
            Sink::Gzip(encoder) => encoder.finish().map_err(|e| Error::io(context(), e))?,
        };
        let temp = writer
            .into_inner()
            .map_err(|e| Error::io(context(), e.into_error()))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| Error::io(context(), e))?;
        temp.persist(&self.path)
            .map_err(|e| Error::io(context(), e.error))?;
        Ok(())
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.sink {
            Sink::Plain(writer) => writer.write(buf),
            Sink::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.sink {
            Sink::Plain(writer) => writer.flush(),
            Sink::Gzip(encoder) => encoder.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, Write};

    use super::{AtomicFile, open_reader};

    #[test]
    fn test_atomic_file_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.txt");
        let mut file = AtomicFile::create(&path).unwrap();
        writeln!(file, "0\t1,2\t3:2").unwrap();
        assert!(!path.exists());
        file.commit().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0\t1,2\t3:2\n");
    }

    #[test]
    fn test_atomic_file_drop_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt");
        std::fs::write(&path, "old\n").unwrap();
        {
            let mut file = AtomicFile::create(&path).unwrap();
            writeln!(file, "new").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_gzip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt.gz");
        let mut file = AtomicFile::create(&path).unwrap();
        writeln!(file, "first").unwrap();
        writeln!(file, "second").unwrap();
        file.commit().unwrap();

        let lines = open_reader(&path)
            .unwrap()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(lines, ["first", "second"]);
    }
}
