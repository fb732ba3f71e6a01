//! Split commands implementation

use std::path::Path;

use anyhow::{Context, Result};
use colprof_eq::{ClassFormat, EquivalenceClassIndex};

use super::validate_file_exists;

pub fn run_nodes(classes: &Path, output_dir: &Path, shards: usize, prefix: &str) -> Result<()> {
    let index = load(classes, ClassFormat::Full, output_dir)?;
    let paths = index
        .split_nodes(shards, output_dir, prefix)
        .context("Failed to split classes")?;
    log::info!("{} node shards written to {}", paths.len(), output_dir.display());
    Ok(())
}

pub fn run_columns(classes: &Path, output_dir: &Path, shards: usize, prefix: &str) -> Result<()> {
    let index = load(classes, ClassFormat::Summary, output_dir)?;
    let paths = index
        .split_columns(shards, output_dir, prefix)
        .context("Failed to split columns")?;
    log::info!("{} column shards written to {}", paths.len(), output_dir.display());
    Ok(())
}

fn load(classes: &Path, format: ClassFormat, output_dir: &Path) -> Result<EquivalenceClassIndex> {
    validate_file_exists(classes)?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    EquivalenceClassIndex::load(classes, format)
        .with_context(|| format!("Failed to load classes from {}", classes.display()))
}
