//! # Equivalence Class Compression
//!
//! Partitions a term index into equivalence classes: groups of terms with an
//! identical column signature.
//!
//! The compressor streams the term index once, keeping a hash map from
//! signature to the class being built. Terms occurring in fewer than
//! `column_threshold` columns are dropped. The first term with a new
//! signature opens a class with the next sequential id; later terms with the
//! same signature join it and add their counts to the class totals. Classes
//! are emitted in the order their signatures were discovered.
//!
//! With `merge_terms` set, a grouping pass runs first: terms whose values
//! agree on their letters and digits (`"1,000"` and `"1000"`) are merged into
//! provisional classes, which then seed the signature pass as single units.

use std::path::{Path, PathBuf};

use ahash::{AHashMap, AHashSet};
use colprof_common::{
    ClassId, Result, TermId,
    error::Error,
    fs::AtomicFile,
};
use colprof_term_index::{TermIndexReader, TermRecord};

use crate::{
    class::{ClassBuilder, EquivalenceClass},
    signature::Signature,
};

/// Configuration of the signature compressor.
#[derive(Debug, Clone)]
pub struct CompressorConfig {
    /// Minimum number of distinct columns a term (or merged group) must occur
    /// in to be kept.
    pub column_threshold: usize,

    /// Group by exact `(column, count)` lists instead of column sets.
    pub observe_frequencies: bool,

    /// Merge terms that agree on letters and digits before grouping.
    pub merge_terms: bool,

    /// Id given to the first new class. A run that extends classes of an
    /// earlier run passes that run's largest id plus one.
    pub first_class_id: ClassId,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        CompressorConfig {
            column_threshold: 1,
            observe_frequencies: false,
            merge_terms: false,
            first_class_id: 0,
        }
    }
}

/// Counters reported by the compressor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionSummary {
    pub terms_read: u64,
    pub terms_dropped: u64,
    /// Terms already placed by the grouping pass.
    pub terms_grouped: u64,
    pub classes: u64,
}

/// A re-readable stream of term records.
///
/// The grouping and sharded variants scan the term index more than once.
pub trait TermSource {
    fn terms(&self) -> Result<Box<dyn Iterator<Item = Result<TermRecord>> + '_>>;
}

impl TermSource for Path {
    fn terms(&self) -> Result<Box<dyn Iterator<Item = Result<TermRecord>> + '_>> {
        Ok(Box::new(TermIndexReader::open(self)?))
    }
}

impl TermSource for PathBuf {
    fn terms(&self) -> Result<Box<dyn Iterator<Item = Result<TermRecord>> + '_>> {
        self.as_path().terms()
    }
}

impl TermSource for [TermRecord] {
    fn terms(&self) -> Result<Box<dyn Iterator<Item = Result<TermRecord>> + '_>> {
        Ok(Box::new(self.iter().cloned().map(Ok)))
    }
}

impl TermSource for Vec<TermRecord> {
    fn terms(&self) -> Result<Box<dyn Iterator<Item = Result<TermRecord>> + '_>> {
        self.as_slice().terms()
    }
}

/// Single-pass signature compressor.
pub struct EquivalenceClassCompressor {
    config: CompressorConfig,
    by_signature: AHashMap<Signature, usize>,
    classes: Vec<(ClassId, ClassBuilder)>,
    /// Terms already owned by a seed class.
    seeded_terms: AHashSet<TermId>,
    next_id: ClassId,
    summary: CompressionSummary,
}

impl EquivalenceClassCompressor {
    pub fn new(config: CompressorConfig) -> Self {
        let next_id = config.first_class_id;
        EquivalenceClassCompressor {
            config,
            by_signature: AHashMap::new(),
            classes: Vec::new(),
            seeded_terms: AHashSet::new(),
            next_id,
            summary: CompressionSummary::default(),
        }
    }

    /// Starts from existing classes that keep their ids.
    ///
    /// Seeds are keyed by their column signature; seeds with equal signatures
    /// are merged into the first of them and the later ids go unused. Terms of a seed are not added
    /// again when they show up in the term stream, and new classes get ids
    /// after the largest seed id (or `first_class_id`, whichever is larger).
    pub fn with_seeds(
        config: CompressorConfig,
        seeds: impl IntoIterator<Item = (ClassId, ClassBuilder)>,
    ) -> Result<Self> {
        let mut compressor = EquivalenceClassCompressor::new(config);
        for (id, seed) in seeds {
            let signature = Signature::of(seed.columns(), compressor.config.observe_frequencies)?;
            compressor.seeded_terms.extend(seed.terms());
            match compressor.by_signature.get(&signature) {
                Some(&pos) => compressor.classes[pos].1.absorb(seed),
                None => {
                    compressor
                        .by_signature
                        .insert(signature, compressor.classes.len());
                    compressor.classes.push((id, seed));
                }
            }
            compressor.next_id = compressor.next_id.max(id + 1);
        }
        compressor.summary.terms_grouped = compressor.seeded_terms.len() as u64;
        Ok(compressor)
    }

    /// Adds one term.
    ///
    /// # Errors
    ///
    /// `InvariantViolation` if the term has no columns.
    pub fn push(&mut self, term: &TermRecord) -> Result<()> {
        self.summary.terms_read += 1;
        if term.columns.is_empty() {
            colprof_common::invariant_violation!(
                "term {} ('{}') has no columns",
                term.id,
                term.value
            );
        }
        if self.seeded_terms.contains(&term.id) {
            return Ok(());
        }
        if term.columns.len() < self.config.column_threshold {
            self.summary.terms_dropped += 1;
            return Ok(());
        }
        let signature = Signature::of(&term.columns, self.config.observe_frequencies)?;
        let pos = match self.by_signature.get(&signature) {
            Some(&pos) => pos,
            None => {
                let pos = self.classes.len();
                self.by_signature.insert(signature, pos);
                self.classes.push((self.next_id, ClassBuilder::new()));
                self.next_id += 1;
                pos
            }
        };
        self.classes[pos].1.add_term(term.id, &term.columns);
        Ok(())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Freezes all classes, in discovery order.
    pub fn finish(mut self) -> (Vec<EquivalenceClass>, CompressionSummary) {
        self.summary.classes = self.classes.len() as u64;
        let classes = self
            .classes
            .into_iter()
            .map(|(id, builder)| builder.build(id))
            .collect();
        (classes, self.summary)
    }
}

/// Key under which the grouping pass merges term values.
///
/// Keeps letters and digits only. A value without any letter or digit keeps
/// its raw form, so punctuation-only values only group with themselves.
pub fn group_key(value: &str) -> String {
    let key = value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>();
    if key.is_empty() {
        value.to_string()
    } else {
        key
    }
}

/// Grouping pass: merges terms sharing a [`group_key`] into provisional
/// classes.
///
/// Only groups with at least two members are formed, and only groups whose
/// merged column list meets `column_threshold` are returned. Groups with
/// the same signature are merged, and the result is numbered densely from
/// `first_class_id` in group-key order.
pub fn group_terms<S>(source: &S, config: &CompressorConfig) -> Result<Vec<(ClassId, ClassBuilder)>>
where
    S: TermSource + ?Sized,
{
    let mut keys = Vec::new();
    for term in source.terms()? {
        let term = term?;
        keys.push((group_key(&term.value), term.id));
    }
    keys.sort_unstable();

    let mut group_of: AHashMap<TermId, usize> = AHashMap::new();
    let mut group_count = 0;
    for chunk in keys.chunk_by(|a, b| a.0 == b.0) {
        if chunk.len() > 1 {
            for (_, term) in chunk {
                group_of.insert(*term, group_count);
            }
            group_count += 1;
        }
    }
    drop(keys);

    let mut groups = vec![ClassBuilder::new(); group_count];
    for term in source.terms()? {
        let term = term?;
        if let Some(&group) = group_of.get(&term.id) {
            groups[group].add_term(term.id, &term.columns);
        }
    }

    // Groups whose merged columns coincide become one provisional class, so
    // the seed ids stay dense.
    let mut by_signature: AHashMap<Signature, usize> = AHashMap::new();
    let mut merged: Vec<ClassBuilder> = Vec::new();
    for group in groups {
        if group.columns().len() < config.column_threshold {
            continue;
        }
        let signature = Signature::of(group.columns(), config.observe_frequencies)?;
        match by_signature.get(&signature) {
            Some(&pos) => merged[pos].absorb(group),
            None => {
                by_signature.insert(signature, merged.len());
                merged.push(group);
            }
        }
    }
    let accepted = merged
        .into_iter()
        .enumerate()
        .map(|(i, group)| (config.first_class_id + i as ClassId, group))
        .collect::<Vec<_>>();
    log::info!(
        "grouping pass: {group_count} groups of equivalent values, {} kept",
        accepted.len()
    );
    Ok(accepted)
}

/// Compresses a term stream in a single pass.
///
/// `merge_terms` needs a second look at the input and is rejected here; use
/// [`compress_source`] for it.
pub fn compress<I>(
    terms: I,
    config: CompressorConfig,
) -> Result<(Vec<EquivalenceClass>, CompressionSummary)>
where
    I: IntoIterator<Item = Result<TermRecord>>,
{
    if config.merge_terms {
        return Err(Error::invalid_arg(
            "merge_terms",
            "the grouping pass needs a re-readable term source",
        ));
    }
    let mut compressor = EquivalenceClassCompressor::new(config);
    for term in terms {
        compressor.push(&term?)?;
    }
    Ok(compressor.finish())
}

/// Compresses a re-readable term source, running the grouping pass first
/// when `merge_terms` is set.
pub fn compress_source<S>(
    source: &S,
    config: CompressorConfig,
) -> Result<(Vec<EquivalenceClass>, CompressionSummary)>
where
    S: TermSource + ?Sized,
{
    let mut compressor = if config.merge_terms {
        let seeds = group_terms(source, &config)?;
        EquivalenceClassCompressor::with_seeds(config, seeds)?
    } else {
        EquivalenceClassCompressor::new(config)
    };
    for term in source.terms()? {
        compressor.push(&term?)?;
    }
    Ok(compressor.finish())
}

/// Writes classes as a class file, replacing `output` atomically.
pub fn write_classes<'a>(
    classes: impl IntoIterator<Item = &'a EquivalenceClass>,
    output: &Path,
) -> Result<()> {
    let mut out = AtomicFile::create(output)?;
    for class in classes {
        class.write_line(&mut out, output)?;
    }
    out.commit()
}

/// Compresses the term-index file `input` into the class file `output`.
pub fn compress_file(
    input: &Path,
    output: &Path,
    config: CompressorConfig,
) -> Result<CompressionSummary> {
    let (classes, summary) = compress_source(input, config)?;
    write_classes(&classes, output)?;
    log::info!(
        "{}: {} terms read, {} dropped, {} classes written to {}",
        input.display(),
        summary.terms_read,
        summary.terms_dropped,
        summary.classes,
        output.display()
    );
    Ok(summary)
}
