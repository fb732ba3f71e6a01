//! Column similarity command implementation

use std::path::Path;

use anyhow::{Context, Result};
use colprof_eq::{ClassFormat, EquivalenceClassIndex};
use colprof_overlap::{ColumnWeights, column_class_nodes, column_term_nodes, write_pairs};
use colprof_term_index::{ColumnTermSets, TermIndexReader};

use super::{class_overlap::engine, timed, validate_file_exists};
use crate::OverlapArgs;

pub fn run(
    input: &Path,
    output: &Path,
    from_terms: bool,
    weights: Option<ColumnWeights>,
    args: &OverlapArgs,
) -> Result<()> {
    validate_file_exists(input)?;
    let nodes = if from_terms {
        let reader = TermIndexReader::open(input)?;
        let columns = ColumnTermSets::from_terms(reader)
            .with_context(|| format!("Failed to read terms from {}", input.display()))?;
        column_term_nodes(&columns, weights)
    } else {
        let index = EquivalenceClassIndex::load(input, ClassFormat::Summary)
            .with_context(|| format!("Failed to load classes from {}", input.display()))?;
        column_class_nodes(&index)
    };
    log::info!("{} columns", nodes.len());

    let engine = engine(args)?;
    let pairs = timed("column similarity", || Ok(engine.run(&nodes)?))?;
    write_pairs(&pairs, output, args.similarity)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}
