//! Compress command implementation

use std::path::Path;

use anyhow::{Context, Result};
use colprof_eq::{CompressorConfig, ShardedCompressorConfig, compress_file, compress_file_sharded};

use super::{timed, validate_file_exists};

pub struct Options {
    pub column_threshold: usize,
    pub frequencies: bool,
    pub merge_terms: bool,
    pub first_class_id: u64,
    pub passes: Option<usize>,
}

pub fn run(input: &Path, output: &Path, options: Options) -> Result<()> {
    validate_file_exists(input)?;
    let summary = timed("compression", || {
        let result = match options.passes {
            Some(passes) => {
                let config = ShardedCompressorConfig {
                    column_threshold: options.column_threshold,
                    observe_frequencies: options.frequencies,
                    first_class_id: options.first_class_id,
                    passes,
                };
                compress_file_sharded(input, output, &config)
            }
            None => {
                let config = CompressorConfig {
                    column_threshold: options.column_threshold,
                    observe_frequencies: options.frequencies,
                    merge_terms: options.merge_terms,
                    first_class_id: options.first_class_id,
                };
                compress_file(input, output, config)
            }
        };
        result.with_context(|| format!("Failed to compress {}", input.display()))
    })?;
    log::info!(
        "{} classes from {} terms ({} below the column threshold, {} grouped)",
        summary.classes,
        summary.terms_read,
        summary.terms_dropped,
        summary.terms_grouped
    );
    Ok(())
}
