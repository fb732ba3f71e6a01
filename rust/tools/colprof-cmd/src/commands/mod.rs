//! Command implementations for colprof

use std::{path::Path, time::Instant};

use anyhow::Result;

pub mod class_overlap;
pub mod column_similarity;
pub mod compress;
pub mod filter_columns;
pub mod merge_terms;
pub mod split;
pub mod stats;
pub mod term_index;

/// Fails early with a readable message when an input file is missing.
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    if !path.is_file() {
        anyhow::bail!("Path is not a file: {}", path.display());
    }
    Ok(())
}

/// Runs `f` and logs how long it took.
pub fn timed<T>(what: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = f()?;
    log::info!("{what} finished in {:.2?}", start.elapsed());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use colprof_overlap::Similarity;
    use colprof_testkit::{
        data_gen::{CorpusShape, generate_corpus},
        files::{file_names, read_lines},
    };

    use crate::OverlapArgs;

    #[test]
    fn test_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let columns_dir = dir.path().join("columns");
        std::fs::create_dir(&columns_dir).unwrap();
        generate_corpus(&columns_dir, &CorpusShape::default()).unwrap();

        let terms = dir.path().join("terms.txt");
        super::term_index::run(&columns_dir, &terms, 50, Default::default(), true).unwrap();
        assert!(!read_lines(&terms).unwrap().is_empty());

        let classes = dir.path().join("classes.txt");
        let options = super::compress::Options {
            column_threshold: 2,
            frequencies: false,
            merge_terms: false,
            first_class_id: 0,
            passes: None,
        };
        super::compress::run(&terms, &classes, options).unwrap();
        let class_lines = read_lines(&classes).unwrap();
        assert!(!class_lines.is_empty());

        let args = OverlapArgs {
            threads: Some(2),
            threshold: 0.0,
            similarity: Similarity::Overlap,
        };
        let overlap = dir.path().join("overlap.txt");
        super::class_overlap::run(&classes, &overlap, &args).unwrap();
        let pairs = read_lines(&overlap).unwrap();
        assert!(!pairs.is_empty());
        for line in pairs {
            let fields = line.split('\t').collect::<Vec<_>>();
            let [a, b, value] = fields[..] else {
                panic!("bad pair line {line}");
            };
            assert!(a.parse::<u64>().unwrap() < b.parse::<u64>().unwrap());
            assert!(value.parse::<u64>().unwrap() > 0);
        }

        let args = OverlapArgs {
            similarity: Similarity::Jaccard,
            ..args
        };
        let similarity = dir.path().join("similarity.txt");
        super::column_similarity::run(&classes, &similarity, false, None, &args).unwrap();
        let lines = read_lines(&similarity).unwrap();
        assert!(!lines.is_empty());
        for line in lines {
            let value = line.rsplit('\t').next().unwrap().parse::<f64>().unwrap();
            assert!(value > 0.0 && value <= 1.0);
        }

        let shards = dir.path().join("shards");
        super::split::run_nodes(&classes, &shards, 3, "nodes").unwrap();
        assert_eq!(
            file_names(&shards).unwrap(),
            ["nodes.0.txt", "nodes.1.txt", "nodes.2.txt"]
        );
        super::stats::run(&classes, true, false).unwrap();
    }
}
