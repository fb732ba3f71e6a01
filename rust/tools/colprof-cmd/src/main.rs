use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colprof_overlap::{ColumnWeights, Similarity};
use colprof_term_index::ColumnConstraint;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

mod commands;

#[derive(Parser)]
#[command(name = "colprof")]
#[command(about = "Term indexes, equivalence classes and overlap analysis over column values")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the pairwise commands.
#[derive(Args)]
pub struct OverlapArgs {
    /// Number of worker threads (defaults to the available parallelism)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Minimum similarity of a written pair; zero or below keeps every overlapping pair
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    threshold: f64,

    /// Value computed per pair: overlap, jaccard or weighted-jaccard
    #[arg(long, default_value_t = Similarity::Overlap)]
    similarity: Similarity,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a term index from a directory of column files
    TermIndex {
        /// Directory holding one value file per column
        input_dir: PathBuf,

        /// Term-index file to write
        output: PathBuf,

        /// Buffered terms before a sorted run is spilled
        #[arg(long, default_value_t = 10_000_000)]
        buffer_size: usize,

        /// Column acceptance rule, NONE or TEXT:<threshold> (e.g. TEXT:>=0.5)
        #[arg(long, default_value = "NONE")]
        constraint: ColumnConstraint,

        /// Keep values exactly as read
        #[arg(long)]
        raw_values: bool,
    },

    /// Merge two term indexes into one with fresh term ids
    MergeTerms {
        left: PathBuf,
        right: PathBuf,
        output: PathBuf,
    },

    /// Compress a term index into equivalence classes
    Compress {
        /// Term-index file
        input: PathBuf,

        /// Class file to write
        output: PathBuf,

        /// Minimum number of columns a term must occur in
        #[arg(long, default_value_t = 1)]
        column_threshold: usize,

        /// Distinguish terms by their per-column counts too
        #[arg(long)]
        frequencies: bool,

        /// Group equivalent values (such as 1,000 and 1000) before compressing
        #[arg(long, conflicts_with = "passes")]
        merge_terms: bool,

        /// Id of the first class
        #[arg(long, default_value_t = 0)]
        first_class_id: u64,

        /// Compress in this many passes over column ranges to bound memory
        #[arg(long)]
        passes: Option<usize>,
    },

    /// Keep only the listed columns in a term index
    FilterColumns {
        /// Term-index file
        input: PathBuf,

        /// File with one column id per line
        columns: PathBuf,

        /// Term-index file to write
        output: PathBuf,
    },

    /// Compute pairwise term overlap between equivalence classes
    ClassOverlap {
        /// Class file
        classes: PathBuf,

        /// Pair file to write
        output: PathBuf,

        #[command(flatten)]
        overlap: OverlapArgs,
    },

    /// Compute pairwise column similarity
    ColumnSimilarity {
        /// Class file, or a term-index file with --terms
        input: PathBuf,

        /// Pair file to write
        output: PathBuf,

        /// Read columns from a term index instead of a class file
        #[arg(long)]
        terms: bool,

        /// Term weighting inside a column (colsize or colmax), term index input only
        #[arg(long, requires = "terms")]
        weights: Option<ColumnWeights>,

        #[command(flatten)]
        overlap: OverlapArgs,
    },

    /// Split a class file into shards of near-equal term volume
    SplitNodes {
        classes: PathBuf,

        output_dir: PathBuf,

        #[arg(long, default_value_t = 4)]
        shards: usize,

        #[arg(long, default_value = "nodes")]
        prefix: String,
    },

    /// Split the column view of a class file into shards of near-equal term volume
    SplitColumns {
        classes: PathBuf,

        output_dir: PathBuf,

        #[arg(long, default_value_t = 4)]
        shards: usize,

        #[arg(long, default_value = "columns")]
        prefix: String,
    },

    /// Print totals and per-column sizes of a class file
    Stats {
        classes: PathBuf,

        /// Read term counts only, for class files too large to hold in full
        #[arg(long)]
        summary: bool,

        /// Also list the term volume of every column
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Log filter from `RUST_LOG`-style directives, `info` when none are given.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn main() -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::TermIndex {
            input_dir,
            output,
            buffer_size,
            constraint,
            raw_values,
        } => commands::term_index::run(&input_dir, &output, buffer_size, constraint, !raw_values),
        Commands::MergeTerms {
            left,
            right,
            output,
        } => commands::merge_terms::run(&left, &right, &output),
        Commands::Compress {
            input,
            output,
            column_threshold,
            frequencies,
            merge_terms,
            first_class_id,
            passes,
        } => commands::compress::run(
            &input,
            &output,
            commands::compress::Options {
                column_threshold,
                frequencies,
                merge_terms,
                first_class_id,
                passes,
            },
        ),
        Commands::FilterColumns {
            input,
            columns,
            output,
        } => commands::filter_columns::run(&input, &columns, &output),
        Commands::ClassOverlap {
            classes,
            output,
            overlap,
        } => commands::class_overlap::run(&classes, &output, &overlap),
        Commands::ColumnSimilarity {
            input,
            output,
            terms,
            weights,
            overlap,
        } => commands::column_similarity::run(&input, &output, terms, weights, &overlap),
        Commands::SplitNodes {
            classes,
            output_dir,
            shards,
            prefix,
        } => commands::split::run_nodes(&classes, &output_dir, shards, &prefix),
        Commands::SplitColumns {
            classes,
            output_dir,
            shards,
            prefix,
        } => commands::split::run_columns(&classes, &output_dir, shards, &prefix),
        Commands::Stats {
            classes,
            summary,
            verbose,
        } => commands::stats::run(&classes, summary, verbose),
    }
}
