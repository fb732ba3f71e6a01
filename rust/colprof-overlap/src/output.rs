use std::{io::Write, path::Path};

use colprof_common::{Result, error::Error, fs::AtomicFile};

use crate::{index::OverlapIndex, similarity::Similarity};

/// Writes every stored pair as `id1<TAB>id2<TAB>value`, with `id1 < id2`,
/// ordered by id pair.
///
/// The value is the integer overlap for [`Similarity::Overlap`] and the
/// similarity otherwise. Returns the number of lines written.
pub fn write_pairs(index: &OverlapIndex, path: &Path, similarity: Similarity) -> Result<usize> {
    let mut out = AtomicFile::create(path)?;
    let pairs = index.pairs();
    for &(a, b, stats) in &pairs {
        let written = match similarity {
            Similarity::Overlap => writeln!(out, "{a}\t{b}\t{}", stats.overlap),
            _ => writeln!(out, "{a}\t{b}\t{}", stats.similarity),
        };
        written.map_err(|e| Error::io(format!("write {}", path.display()), e))?;
    }
    out.commit()?;
    log::info!("{} pairs written to {}", pairs.len(), path.display());
    Ok(pairs.len())
}
