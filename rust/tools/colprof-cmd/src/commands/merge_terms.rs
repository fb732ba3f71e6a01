//! Merge terms command implementation

use std::path::Path;

use anyhow::{Context, Result};
use colprof_term_index::merge_term_files;

use super::{timed, validate_file_exists};

pub fn run(left: &Path, right: &Path, output: &Path) -> Result<()> {
    validate_file_exists(left)?;
    validate_file_exists(right)?;
    let summary = timed("merge", || {
        merge_term_files(left, right, output).with_context(|| {
            format!(
                "Failed to merge {} and {} into {}",
                left.display(),
                right.display(),
                output.display()
            )
        })
    })?;
    log::info!("{} terms written to {}", summary.terms, output.display());
    Ok(())
}
