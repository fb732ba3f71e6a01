use std::{collections::BTreeMap, path::Path};

use colprof_term_index::{
    ColumnFile, ColumnOutcome, TermIndexBuilder, TermIndexBuilderConfig, TermIndexReader,
    build_term_index, list_column_files, merge_term_files,
};
use colprof_testkit::{
    data_gen::{CorpusShape, generate_corpus},
    files::write_lines,
};

fn build(files: &[ColumnFile], buffer_size: usize, output: &Path) {
    let config = TermIndexBuilderConfig {
        buffer_size,
        ..Default::default()
    };
    build_term_index(files, config, output).unwrap();
}

#[test]
fn test_term_index_counts_match_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let columns_dir = dir.path().join("columns");
    std::fs::create_dir(&columns_dir).unwrap();
    let corpus = generate_corpus(&columns_dir, &CorpusShape::default()).unwrap();

    let files = list_column_files(&columns_dir).unwrap();
    assert_eq!(files.len(), 8);
    let output = dir.path().join("terms.txt");
    build(&files, 16, &output);

    let mut expected: BTreeMap<String, BTreeMap<u32, u64>> = BTreeMap::new();
    for (column, values) in corpus.columns.iter().enumerate() {
        for value in values {
            *expected
                .entry(value.clone())
                .or_default()
                .entry(column as u32)
                .or_default() += 1;
        }
    }

    let records = TermIndexReader::open(&output)
        .unwrap()
        .collect::<colprof_common::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(records.len(), expected.len());
    for (i, (record, (value, columns))) in records.iter().zip(&expected).enumerate() {
        assert_eq!(record.id, i as u64);
        assert_eq!(&record.value, value);
        assert_eq!(
            record.columns.iter().collect::<Vec<_>>(),
            columns.iter().map(|(&c, &n)| (c, n)).collect::<Vec<_>>()
        );
    }
}

#[test]
fn test_final_ids_independent_of_column_order_and_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let shape = CorpusShape {
        columns: 12,
        vocabulary: 300,
        rows_per_column: 80,
        counted: true,
        ..Default::default()
    };
    generate_corpus(dir.path(), &shape).unwrap();
    let files = list_column_files(dir.path()).unwrap();
    let mut reversed = files.clone();
    reversed.reverse();
    fastrand::seed(2985745485);
    let mut shuffled = files.clone();
    fastrand::shuffle(&mut shuffled);

    let out = tempfile::tempdir().unwrap();
    let reference = out.path().join("reference.txt");
    build(&files, usize::MAX, &reference);
    let expected = std::fs::read(&reference).unwrap();
    assert!(!expected.is_empty());

    for (name, order, buffer_size) in [
        ("small-buffer.txt", &files, 7),
        ("reversed.txt", &reversed, 50),
        ("shuffled.txt", &shuffled, 1),
    ] {
        let path = out.path().join(name);
        build(order, buffer_size, &path);
        assert_eq!(std::fs::read(&path).unwrap(), expected, "{name}");
    }
}

#[test]
fn test_merge_with_itself_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    generate_corpus(dir.path(), &CorpusShape::default()).unwrap();
    let files = list_column_files(dir.path()).unwrap();
    let out = tempfile::tempdir().unwrap();
    let index = out.path().join("terms.txt");
    build(&files, 32, &index);

    let merged = out.path().join("merged.txt");
    let summary = merge_term_files(&index, &index, &merged).unwrap();
    assert!(summary.terms > 0);
    assert_eq!(
        std::fs::read(&merged).unwrap(),
        std::fs::read(&index).unwrap()
    );
}

#[test]
fn test_merge_of_partial_indexes_equals_full_build() {
    let dir = tempfile::tempdir().unwrap();
    generate_corpus(dir.path(), &CorpusShape::default()).unwrap();
    let files = list_column_files(dir.path()).unwrap();
    let out = tempfile::tempdir().unwrap();

    let full = out.path().join("full.txt");
    build(&files, 1000, &full);
    let left = out.path().join("left.txt");
    build(&files[..3], 1000, &left);
    let right = out.path().join("right.txt.gz");
    build(&files[3..], 1000, &right);

    let merged = out.path().join("merged.txt");
    merge_term_files(&left, &right, &merged).unwrap();
    assert_eq!(
        std::fs::read(&merged).unwrap(),
        std::fs::read(&full).unwrap()
    );
}

#[test]
fn test_malformed_column_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_lines(dir.path(), "1.tsv", ["alpha\t2", "beta\t1"]).unwrap();
    let bad = write_lines(dir.path(), "2.tsv", ["alpha\t5", "gamma", "delta\t1"]).unwrap();
    let output = dir.path().join("terms.txt");

    let mut builder = TermIndexBuilder::new(Default::default(), &output).unwrap();
    let good = ColumnFile::from_path(good).unwrap();
    let bad = ColumnFile::from_path(bad).unwrap();
    assert_eq!(
        builder.ingest_file(&good).unwrap(),
        ColumnOutcome::Accepted { terms: 2 }
    );
    assert_eq!(builder.ingest_file(&bad).unwrap(), ColumnOutcome::Skipped);
    let missing = ColumnFile {
        id: 3,
        path: dir.path().join("3.txt"),
    };
    assert_eq!(builder.ingest_file(&missing).unwrap(), ColumnOutcome::Skipped);

    let summary = builder.finish().unwrap();
    assert_eq!(summary.columns_accepted, 1);
    assert_eq!(summary.columns_skipped, 2);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "0\talpha\t0\t1:2\n1\tbeta\t0\t1:1\n"
    );
}

#[test]
fn test_empty_input_writes_empty_index() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("terms.txt");
    let summary = TermIndexBuilder::new(Default::default(), &output)
        .unwrap()
        .finish()
        .unwrap();
    assert_eq!(summary.terms, 0);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}
