//! Filter columns command implementation

use std::path::Path;

use anyhow::{Context, Result};
use colprof_term_index::filter::{filter_columns, read_column_list};

use super::validate_file_exists;

pub fn run(input: &Path, columns: &Path, output: &Path) -> Result<()> {
    validate_file_exists(input)?;
    let keep = read_column_list(columns)
        .with_context(|| format!("Failed to read column list {}", columns.display()))?;
    log::info!("keeping {} columns", keep.len());
    let summary = filter_columns(input, &keep, output)
        .with_context(|| format!("Failed to filter {}", input.display()))?;
    log::info!(
        "{} of {} terms written to {}",
        summary.terms_written,
        summary.terms_read,
        output.display()
    );
    Ok(())
}
