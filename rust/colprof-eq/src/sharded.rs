//! Bounded-memory compression.
//!
//! Signatures are partitioned by their smallest column id. Each pass over the
//! term index handles one contiguous range of smallest-column ids and keeps a
//! separate signature map per smallest column, so only the classes of the
//! current range are held in memory. Buckets are emitted in column-id order,
//! classes within a bucket in discovery order, and ids are assigned as classes
//! are emitted.

use std::{collections::BTreeMap, path::Path};

use ahash::AHashMap;
use colprof_common::{ClassId, ColumnId, Result, fs::AtomicFile};

use crate::{
    class::{ClassBuilder, EquivalenceClass},
    compressor::{CompressionSummary, TermSource},
    signature::Signature,
};

/// Configuration of the sharded compressor.
#[derive(Debug, Clone)]
pub struct ShardedCompressorConfig {
    pub column_threshold: usize,
    pub observe_frequencies: bool,
    pub first_class_id: ClassId,
    /// Number of passes over the term index; each pass covers one range of
    /// smallest-column ids.
    pub passes: usize,
}

impl Default for ShardedCompressorConfig {
    fn default() -> Self {
        ShardedCompressorConfig {
            column_threshold: 1,
            observe_frequencies: false,
            first_class_id: 0,
            passes: 4,
        }
    }
}

#[derive(Default)]
struct Bucket {
    by_signature: AHashMap<Signature, usize>,
    classes: Vec<ClassBuilder>,
}

/// Splits the inclusive range `min..=max` into at most `passes` contiguous
/// ranges of near-equal width.
fn column_ranges(min: ColumnId, max: ColumnId, passes: usize) -> Vec<(ColumnId, ColumnId)> {
    let width = u64::from(max - min) + 1;
    let passes = (passes as u64).min(width);
    let step = width.div_ceil(passes);
    let mut ranges = Vec::with_capacity(passes as usize);
    let mut start = u64::from(min);
    while start <= u64::from(max) {
        let end = (start + step - 1).min(u64::from(max));
        ranges.push((start as ColumnId, end as ColumnId));
        start = end + 1;
    }
    ranges
}

/// Compresses `source` in several passes, handing every finished class to
/// `emit` as soon as its bucket is complete.
///
/// Produces the same partition of terms as the single-pass compressor; only
/// the class order (and therefore the ids) differs.
pub fn compress_sharded<S, F>(
    source: &S,
    config: &ShardedCompressorConfig,
    mut emit: F,
) -> Result<CompressionSummary>
where
    S: TermSource + ?Sized,
    F: FnMut(EquivalenceClass) -> Result<()>,
{
    colprof_common::verify_arg!(passes, config.passes > 0);

    let mut summary = CompressionSummary::default();
    let mut bounds: Option<(ColumnId, ColumnId)> = None;
    for term in source.terms()? {
        let term = term?;
        summary.terms_read += 1;
        let Some(smallest) = term.columns.smallest_column() else {
            colprof_common::invariant_violation!("term {} ('{}') has no columns", term.id, term.value);
        };
        if term.columns.len() < config.column_threshold {
            summary.terms_dropped += 1;
            continue;
        }
        bounds = Some(match bounds {
            None => (smallest, smallest),
            Some((lo, hi)) => (lo.min(smallest), hi.max(smallest)),
        });
    }
    let Some((min, max)) = bounds else {
        return Ok(summary);
    };

    let mut next_id = config.first_class_id;
    for (pass, (lo, hi)) in column_ranges(min, max, config.passes).into_iter().enumerate() {
        let mut buckets: BTreeMap<ColumnId, Bucket> = BTreeMap::new();
        for term in source.terms()? {
            let term = term?;
            if term.columns.len() < config.column_threshold {
                continue;
            }
            let signature = Signature::of(&term.columns, config.observe_frequencies)?;
            let smallest = signature.smallest_column();
            if smallest < lo || smallest > hi {
                continue;
            }
            let bucket = buckets.entry(smallest).or_default();
            let pos = match bucket.by_signature.get(&signature) {
                Some(&pos) => pos,
                None => {
                    bucket.by_signature.insert(signature, bucket.classes.len());
                    bucket.classes.push(ClassBuilder::new());
                    bucket.classes.len() - 1
                }
            };
            bucket.classes[pos].add_term(term.id, &term.columns);
        }

        let mut emitted = 0;
        for (_, bucket) in buckets {
            for class in bucket.classes {
                emit(class.build(next_id))?;
                next_id += 1;
                emitted += 1;
            }
        }
        summary.classes += emitted;
        log::info!("pass {pass}: columns {lo}..={hi}, {emitted} classes");
    }
    Ok(summary)
}

/// Sharded counterpart of [`compress_file`](crate::compressor::compress_file).
pub fn compress_file_sharded(
    input: &Path,
    output: &Path,
    config: &ShardedCompressorConfig,
) -> Result<CompressionSummary> {
    let mut out = AtomicFile::create(output)?;
    let summary = compress_sharded(input, config, |class| class.write_line(&mut out, output))?;
    out.commit()?;
    log::info!(
        "{}: {} classes written to {} in {} passes",
        input.display(),
        summary.classes,
        output.display(),
        config.passes
    );
    Ok(summary)
}
