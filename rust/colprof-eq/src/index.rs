//! In-memory equivalence-class index.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap},
    io::Write,
    path::{Path, PathBuf},
};

use colprof_common::{ClassId, ColumnId, Result, error::Error, fs::AtomicFile};
use itertools::Itertools;

use crate::class::{ClassFormat, EquivalenceClass, read_classes};

/// Totals over all classes of an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassStats {
    pub classes: u64,
    pub terms: u64,
    /// Sum of all column counts, i.e. the number of column cells covered.
    pub cells: u64,
}

/// A read-only snapshot of a class file, keyed by class id.
#[derive(Debug, Clone, Default)]
pub struct EquivalenceClassIndex {
    classes: BTreeMap<ClassId, EquivalenceClass>,
}

impl EquivalenceClassIndex {
    /// Loads a whole class file.
    ///
    /// A class id that occurs twice fails with `InvalidFormat`.
    pub fn load(path: impl AsRef<Path>, format: ClassFormat) -> Result<Self> {
        let path = path.as_ref();
        let mut classes = BTreeMap::new();
        for class in read_classes(path, format)? {
            let class = class?;
            let id = class.id();
            if classes.insert(id, class).is_some() {
                return Err(Error::invalid_format(
                    path.display().to_string(),
                    format!("class id {id} occurs more than once"),
                ));
            }
        }
        log::info!("loaded {} classes from {}", classes.len(), path.display());
        Ok(EquivalenceClassIndex { classes })
    }

    pub fn from_classes(classes: impl IntoIterator<Item = EquivalenceClass>) -> Result<Self> {
        let mut index = BTreeMap::new();
        for class in classes {
            let id = class.id();
            if index.insert(id, class).is_some() {
                return Err(Error::invalid_arg(
                    "classes",
                    format!("class id {id} occurs more than once"),
                ));
            }
        }
        Ok(EquivalenceClassIndex { classes: index })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, id: ClassId) -> Option<&EquivalenceClass> {
        self.classes.get(&id)
    }

    /// Classes in ascending id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &EquivalenceClass> {
        self.classes.values()
    }

    pub fn max_id(&self) -> Option<ClassId> {
        self.classes.keys().next_back().copied()
    }

    /// Term volume per column: for every column, the summed term count of the
    /// classes occurring in it.
    pub fn column_sizes(&self) -> BTreeMap<ColumnId, u64> {
        let mut sizes = BTreeMap::new();
        for class in self.classes.values() {
            let terms = class.term_count() as u64;
            for column in class.columns().columns() {
                *sizes.entry(column).or_default() += terms;
            }
        }
        sizes
    }

    /// Term count per class id, indexed densely up to the largest id.
    ///
    /// Slots of ids without a class hold zero.
    pub fn node_sizes(&self) -> Vec<usize> {
        let Some(max) = self.max_id() else {
            return Vec::new();
        };
        let mut sizes = vec![0; max as usize + 1];
        for (&id, class) in &self.classes {
            sizes[id as usize] = class.term_count();
        }
        sizes
    }

    /// The derived column view: column id to ascending class ids.
    pub fn columns(&self) -> BTreeMap<ColumnId, Vec<ClassId>> {
        let mut columns: BTreeMap<ColumnId, Vec<ClassId>> = BTreeMap::new();
        for (&id, class) in &self.classes {
            for column in class.columns().columns() {
                columns.entry(column).or_default().push(id);
            }
        }
        columns
    }

    pub fn stats(&self) -> ClassStats {
        let mut stats = ClassStats::default();
        for class in self.classes.values() {
            stats.classes += 1;
            stats.terms += class.term_count() as u64;
            stats.cells += class.columns().total();
        }
        stats
    }

    /// Writes the classes into `shards` class files of near-equal term volume.
    ///
    /// Every class lands in exactly one shard; shards list their classes in
    /// ascending id order. Files are named `<prefix>.<i>.txt` inside `dir` and
    /// are all created, even when empty. Requires classes read in full.
    pub fn split_nodes(&self, shards: usize, dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
        colprof_common::verify_arg!(shards, shards > 0);
        if let Some(class) = self.classes.values().find(|c| c.is_summary()) {
            return Err(Error::unsupported_operation(format!(
                "split summary class {} into node shards",
                class.id()
            )));
        }
        let assignment = balance(
            self.classes
                .values()
                .map(|class| (class.id(), class.term_count() as u64)),
            shards,
        );
        write_shards(dir, prefix, assignment, |out, path, id| {
            if let Some(class) = self.classes.get(&id) {
                class.write_line(out, path)?;
            }
            Ok(())
        })
    }

    /// Writes the column view into `shards` files of near-equal term volume.
    ///
    /// Each line is `column<TAB>class,class,...`. Files are named like the
    /// node shards.
    pub fn split_columns(&self, shards: usize, dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
        colprof_common::verify_arg!(shards, shards > 0);
        let sizes = self.column_sizes();
        let columns = self.columns();
        let assignment = balance(
            sizes.iter().map(|(&column, &size)| (u64::from(column), size)),
            shards,
        );
        write_shards(dir, prefix, assignment, |out, path, column| {
            if let Some(classes) = columns.get(&(column as ColumnId)) {
                writeln!(out, "{column}\t{}", classes.iter().join(","))
                    .map_err(|e| Error::io(format!("write {}", path.display()), e))?;
            }
            Ok(())
        })
    }
}

/// Greedy size balancing: the largest items go first, each to the currently
/// lightest shard. Returns the ascending item ids of every shard.
fn balance(items: impl Iterator<Item = (u64, u64)>, shards: usize) -> Vec<Vec<u64>> {
    let mut items = items.collect::<Vec<_>>();
    items.sort_unstable_by_key(|&(id, size)| (Reverse(size), id));
    let mut heap = (0..shards)
        .map(|shard| Reverse((0u64, shard)))
        .collect::<BinaryHeap<_>>();
    let mut assignment = vec![Vec::new(); shards];
    for (id, size) in items {
        if let Some(Reverse((load, shard))) = heap.pop() {
            assignment[shard].push(id);
            heap.push(Reverse((load + size.max(1), shard)));
        }
    }
    for ids in &mut assignment {
        ids.sort_unstable();
    }
    assignment
}

fn write_shards<F>(
    dir: &Path,
    prefix: &str,
    assignment: Vec<Vec<u64>>,
    mut write_item: F,
) -> Result<Vec<PathBuf>>
where
    F: FnMut(&mut AtomicFile, &Path, u64) -> Result<()>,
{
    let mut paths = Vec::with_capacity(assignment.len());
    for (shard, ids) in assignment.into_iter().enumerate() {
        let path = dir.join(format!("{prefix}.{shard}.txt"));
        let mut out = AtomicFile::create(&path)?;
        for id in ids {
            write_item(&mut out, &path, id)?;
        }
        out.commit()?;
        paths.push(path);
    }
    Ok(paths)
}
