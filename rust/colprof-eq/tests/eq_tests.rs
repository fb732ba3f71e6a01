use std::collections::{BTreeMap, BTreeSet};

use colprof_common::{ColumnFrequencies, TermId};
use colprof_eq::{
    ClassFormat, CompressorConfig, EquivalenceClass, EquivalenceClassIndex,
    ShardedCompressorConfig, compress, compress_file, compress_file_sharded, compress_sharded,
    compress_source,
};
use colprof_term_index::{TermIndexBuilder, TermRecord};
use colprof_testkit::files::{read_lines, write_lines};

/// Random terms over a small column universe, so that signatures collide.
fn random_terms(count: u64, seed: u64) -> Vec<TermRecord> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..count)
        .map(|id| {
            let width = rng.usize(1..4);
            let pairs = (0..width)
                .map(|_| (rng.u32(0..6), rng.u64(1..3)))
                .collect::<BTreeMap<_, _>>();
            let columns = ColumnFrequencies::from_pairs(pairs).unwrap();
            TermRecord::new(id, format!("term{id}"), columns)
        })
        .collect()
}

fn class_of(classes: &[EquivalenceClass]) -> BTreeMap<TermId, u64> {
    let mut owner = BTreeMap::new();
    for class in classes {
        for &term in class.terms().unwrap() {
            assert!(owner.insert(term, class.id()).is_none(), "term {term} in two classes");
        }
    }
    owner
}

#[test]
fn test_partition_is_complete() {
    for threshold in [1, 2, 3] {
        let terms = random_terms(500, 2985745485);
        let config = CompressorConfig {
            column_threshold: threshold,
            ..Default::default()
        };
        let (classes, summary) = compress(terms.iter().cloned().map(Ok), config).unwrap();
        let owner = class_of(&classes);
        let expected = terms
            .iter()
            .filter(|t| t.columns.len() >= threshold)
            .map(|t| t.id)
            .collect::<BTreeSet<_>>();
        assert_eq!(owner.keys().copied().collect::<BTreeSet<_>>(), expected);
        assert_eq!(summary.terms_dropped as usize, terms.len() - expected.len());

        let ids = classes.iter().map(|c| c.id()).collect::<Vec<_>>();
        assert_eq!(ids, (0..classes.len() as u64).collect::<Vec<_>>());
    }
}

#[test]
fn test_same_class_iff_same_signature() {
    let terms = random_terms(300, 7);
    for observe_frequencies in [false, true] {
        let config = CompressorConfig {
            observe_frequencies,
            ..Default::default()
        };
        let (classes, _) = compress(terms.iter().cloned().map(Ok), config).unwrap();
        let owner = class_of(&classes);
        let key = |t: &TermRecord| {
            if observe_frequencies {
                t.columns.to_string()
            } else {
                t.columns.columns().map(|c| c.to_string()).collect::<Vec<_>>().join(",")
            }
        };
        for a in &terms {
            for b in &terms {
                assert_eq!(
                    owner[&a.id] == owner[&b.id],
                    key(a) == key(b),
                    "terms {} and {}",
                    a.id,
                    b.id
                );
            }
        }
        let signatures = classes
            .iter()
            .map(|c| {
                let first = c.terms().unwrap()[0];
                key(&terms[first as usize])
            })
            .collect::<BTreeSet<_>>();
        assert_eq!(signatures.len(), classes.len());
    }
}

#[test]
fn test_three_column_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let terms_path = dir.path().join("terms.txt");
    let mut builder = TermIndexBuilder::new(Default::default(), &terms_path).unwrap();
    for (column, values) in [(1, ["a", "b"]), (2, ["a", "c"]), (3, ["b", "c"])] {
        builder
            .ingest_column(column, values.map(|v| Ok((v.to_string(), 1))))
            .unwrap();
    }
    builder.finish().unwrap();
    assert_eq!(
        read_lines(&terms_path).unwrap(),
        ["0\ta\t0\t1:1,2:1", "1\tb\t0\t1:1,3:1", "2\tc\t0\t2:1,3:1"]
    );

    let classes_path = dir.path().join("classes.txt");
    let summary = compress_file(&terms_path, &classes_path, CompressorConfig::default()).unwrap();
    assert_eq!(summary.classes, 3);
    assert_eq!(
        read_lines(&classes_path).unwrap(),
        ["0\t0\t1:1,2:1", "1\t1\t1:1,3:1", "2\t2\t2:1,3:1"]
    );

    let config = CompressorConfig {
        column_threshold: 3,
        ..Default::default()
    };
    let summary = compress_file(&terms_path, &classes_path, config).unwrap();
    assert_eq!(summary.classes, 0);
    assert_eq!(summary.terms_dropped, 3);
    assert!(read_lines(&classes_path).unwrap().is_empty());
}

#[test]
fn test_empty_index_yields_no_classes() {
    let dir = tempfile::tempdir().unwrap();
    let terms_path = write_lines(dir.path(), "terms.txt", Vec::<String>::new()).unwrap();
    let classes_path = dir.path().join("classes.txt");
    let summary = compress_file(&terms_path, &classes_path, CompressorConfig::default()).unwrap();
    assert_eq!(summary.classes, 0);
    let sharded = dir.path().join("sharded.txt");
    let summary =
        compress_file_sharded(&terms_path, &sharded, &ShardedCompressorConfig::default()).unwrap();
    assert_eq!(summary.classes, 0);
    assert_eq!(std::fs::read_to_string(&sharded).unwrap(), "");
}

#[test]
fn test_sharded_matches_single_pass_partition() {
    let terms = random_terms(400, 11);
    let normalize = |classes: Vec<EquivalenceClass>| {
        classes
            .into_iter()
            .map(|c| {
                (
                    c.terms().unwrap().to_vec(),
                    c.columns().to_string(),
                )
            })
            .collect::<BTreeSet<_>>()
    };
    let (single, _) = compress(terms.iter().cloned().map(Ok), CompressorConfig::default()).unwrap();
    for passes in [1, 3, 8] {
        let config = ShardedCompressorConfig {
            passes,
            ..Default::default()
        };
        let mut sharded = Vec::new();
        compress_sharded(&terms, &config, |class| {
            sharded.push(class);
            Ok(())
        })
        .unwrap();
        let smallest = sharded
            .iter()
            .map(|c| c.columns().smallest_column().unwrap())
            .collect::<Vec<_>>();
        assert!(smallest.is_sorted(), "buckets out of column order");
        assert_eq!(normalize(sharded), normalize(single.clone()));
    }
}

#[test]
fn test_grouped_compression_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let terms_path = write_lines(
        dir.path(),
        "terms.txt",
        [
            "0\t1,000\t1\t1:1",
            "1\t1000\t1\t2:1",
            "2\t2000\t1\t1:1,2:1",
            "3\tSOHO\t0\t3:1,4:1",
        ],
    )
    .unwrap();
    let config = CompressorConfig {
        merge_terms: true,
        column_threshold: 2,
        first_class_id: 100,
        ..Default::default()
    };
    let (classes, summary) = compress_source(terms_path.as_path(), config).unwrap();
    assert_eq!(summary.terms_grouped, 2);
    let classes = classes
        .iter()
        .map(|c| (c.id(), c.terms().unwrap().to_vec()))
        .collect::<Vec<_>>();
    assert_eq!(classes, [(100, vec![0, 1, 2]), (101, vec![3])]);
}

#[test]
fn test_index_aggregates_and_shards() {
    let dir = tempfile::tempdir().unwrap();
    let classes_path = write_lines(
        dir.path(),
        "classes.txt",
        [
            "0\t0,1,2\t1:3,2:3",
            "1\t3\t2:1",
            "3\t4,5\t1:2,3:4",
        ],
    )
    .unwrap();
    let index = EquivalenceClassIndex::load(&classes_path, ClassFormat::Full).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(
        index.column_sizes().into_iter().collect::<Vec<_>>(),
        [(1, 5), (2, 4), (3, 2)]
    );
    assert_eq!(index.node_sizes(), [3, 1, 0, 2]);
    let stats = index.stats();
    assert_eq!((stats.classes, stats.terms, stats.cells), (3, 6, 13));
    assert_eq!(index.columns()[&1], [0, 3]);

    let summary = EquivalenceClassIndex::load(&classes_path, ClassFormat::Summary).unwrap();
    assert_eq!(summary.node_sizes(), index.node_sizes());
    assert!(summary.get(0).unwrap().terms().is_err());
    assert!(summary.split_nodes(2, dir.path(), "nodes").is_err());

    let shards = index.split_nodes(2, dir.path(), "nodes").unwrap();
    assert_eq!(shards.len(), 2);
    let mut lines = shards
        .iter()
        .flat_map(|path| read_lines(path).unwrap())
        .collect::<Vec<_>>();
    lines.sort();
    assert_eq!(lines, read_lines(&classes_path).unwrap());

    let shards = index.split_columns(5, dir.path(), "columns").unwrap();
    assert_eq!(shards.len(), 5);
    assert!(shards[4].ends_with("columns.4.txt"));
    let mut lines = shards
        .iter()
        .flat_map(|path| read_lines(path).unwrap())
        .collect::<Vec<_>>();
    lines.sort();
    assert_eq!(lines, ["1\t0,3", "2\t0,1", "3\t3"]);

    assert!(index.split_columns(0, dir.path(), "columns").is_err());
}

#[test]
fn test_duplicate_class_id_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_lines(dir.path(), "classes.txt", ["0\t1\t1:1", "0\t2\t2:1"]).unwrap();
    assert!(EquivalenceClassIndex::load(&path, ClassFormat::Full).is_err());
}
