//! Stats command implementation

use std::path::Path;

use anyhow::{Context, Result};
use colprof_eq::{ClassFormat, EquivalenceClassIndex};

use super::validate_file_exists;

pub fn run(classes: &Path, summary: bool, verbose: bool) -> Result<()> {
    validate_file_exists(classes)?;
    let format = if summary {
        ClassFormat::Summary
    } else {
        ClassFormat::Full
    };
    let index = EquivalenceClassIndex::load(classes, format)
        .with_context(|| format!("Failed to load classes from {}", classes.display()))?;

    let stats = index.stats();
    let column_sizes = index.column_sizes();
    println!("classes: {}", stats.classes);
    println!("terms:   {}", stats.terms);
    println!("cells:   {}", stats.cells);
    println!("columns: {}", column_sizes.len());
    if stats.classes > 0 {
        println!(
            "terms per class: {:.2}",
            stats.terms as f64 / stats.classes as f64
        );
    }
    if verbose {
        for (column, size) in &column_sizes {
            println!("{column}\t{size}");
        }
    }
    Ok(())
}
