//! Term index command implementation

use std::path::Path;

use anyhow::{Context, Result};
use colprof_term_index::{
    ColumnConstraint, TermIndexBuilderConfig, build_term_index, list_column_files,
};

use super::timed;

pub fn run(
    input_dir: &Path,
    output: &Path,
    buffer_size: usize,
    constraint: ColumnConstraint,
    normalize: bool,
) -> Result<()> {
    let files = list_column_files(input_dir)
        .with_context(|| format!("Failed to list column files in {}", input_dir.display()))?;
    log::info!("{} column files in {}", files.len(), input_dir.display());

    let config = TermIndexBuilderConfig {
        buffer_size,
        constraint,
        normalize,
    };
    let summary = timed("term index", || {
        build_term_index(&files, config, output)
            .with_context(|| format!("Failed to build term index {}", output.display()))
    })?;
    log::info!(
        "{} terms from {} columns ({} rejected, {} skipped, {} flushes)",
        summary.terms,
        summary.columns_accepted,
        summary.columns_rejected,
        summary.columns_skipped,
        summary.flushes
    );
    Ok(())
}
