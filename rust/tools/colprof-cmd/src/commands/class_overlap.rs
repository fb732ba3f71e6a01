//! Class overlap command implementation

use std::path::Path;

use anyhow::{Context, Result};
use colprof_eq::{ClassFormat, EquivalenceClassIndex};
use colprof_overlap::{OverlapConfig, PairwiseOverlapEngine, class_column_nodes, write_pairs};

use super::{timed, validate_file_exists};
use crate::OverlapArgs;

pub fn run(classes: &Path, output: &Path, args: &OverlapArgs) -> Result<()> {
    validate_file_exists(classes)?;
    let index = EquivalenceClassIndex::load(classes, ClassFormat::Summary)
        .with_context(|| format!("Failed to load classes from {}", classes.display()))?;
    let nodes = class_column_nodes(&index);
    let engine = engine(args)?;
    let pairs = timed("class overlap", || Ok(engine.run(&nodes)?))?;
    write_pairs(&pairs, output, args.similarity)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

pub(crate) fn engine(args: &OverlapArgs) -> Result<PairwiseOverlapEngine> {
    let mut config = OverlapConfig {
        threshold: args.threshold,
        similarity: args.similarity,
        ..Default::default()
    };
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    Ok(PairwiseOverlapEngine::new(config)?)
}
