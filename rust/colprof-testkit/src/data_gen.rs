//! Synthetic column data.
//!
//! Columns draw their values from a shared vocabulary so that terms overlap
//! across columns in a controlled, reproducible way.

use std::path::{Path, PathBuf};

/// Shape of a generated column corpus.
#[derive(Debug, Clone)]
pub struct CorpusShape {
    /// Number of column files to generate, with ids `0..columns`.
    pub columns: usize,
    /// Size of the shared value vocabulary.
    pub vocabulary: usize,
    /// Number of value rows drawn per column (duplicates allowed).
    pub rows_per_column: usize,
    /// Write `value<TAB>count` rows instead of one value per line.
    pub counted: bool,
    /// Seed for the random generator.
    pub seed: u64,
}

impl Default for CorpusShape {
    fn default() -> Self {
        CorpusShape {
            columns: 8,
            vocabulary: 200,
            rows_per_column: 100,
            counted: false,
            seed: 2985745485,
        }
    }
}

/// Generated columns: for every column, its file and the values drawn.
pub struct Corpus {
    pub files: Vec<PathBuf>,
    pub columns: Vec<Vec<String>>,
}

/// Produces the value with vocabulary index `i`.
///
/// Mixes plain words, numbers and punctuated variants so that both type
/// detection and letter/digit grouping see realistic inputs.
pub fn vocabulary_value(i: usize) -> String {
    match i % 4 {
        0 => format!("VALUE{i}"),
        1 => format!("{}", i * 1000),
        2 => format!("{},{:03}", i, i % 1000),
        _ => format!("Street {i}"),
    }
}

/// Writes the corpus as `<column>.txt` files under `dir`.
pub fn generate_corpus(dir: &Path, shape: &CorpusShape) -> anyhow::Result<Corpus> {
    anyhow::ensure!(shape.vocabulary > 0, "empty vocabulary");
    let mut rng = fastrand::Rng::with_seed(shape.seed);
    let mut files = Vec::with_capacity(shape.columns);
    let mut columns = Vec::with_capacity(shape.columns);
    for column in 0..shape.columns {
        let values = (0..shape.rows_per_column)
            .map(|_| vocabulary_value(rng.usize(..shape.vocabulary)))
            .collect::<Vec<_>>();
        let lines = if shape.counted {
            let mut counted = std::collections::BTreeMap::<&str, u64>::new();
            for value in &values {
                *counted.entry(value.as_str()).or_default() += 1;
            }
            counted
                .into_iter()
                .map(|(value, count)| format!("{value}\t{count}"))
                .collect::<Vec<_>>()
        } else {
            values.clone()
        };
        files.push(crate::files::write_lines(
            dir,
            &format!("{column}.txt"),
            lines,
        )?);
        columns.push(values);
    }
    Ok(Corpus { files, columns })
}
