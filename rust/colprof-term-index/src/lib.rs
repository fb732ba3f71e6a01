//! Term index construction.
//!
//! A term index lists every distinct value observed in a set of columns,
//! together with its detected type and the columns (and counts) it occurs in.
//! It is built by [`TermIndexBuilder`] from column value files, read back with
//! [`TermIndexReader`], and inverted into a column view by [`ColumnTermSets`].

pub mod builder;
pub mod column;
pub mod columns;
pub mod constraint;
pub mod data_type;
pub mod filter;
pub mod merge;
pub mod reader;
pub mod record;

pub use builder::{
    ColumnOutcome, TermIndexBuilder, TermIndexBuilderConfig, TermIndexSummary, build_term_index,
};
pub use column::{ColumnFile, list_column_files};
pub use columns::{ColumnTermSets, ColumnTerms};
pub use constraint::ColumnConstraint;
pub use data_type::DataType;
pub use merge::{MergeSummary, merge_term_files};
pub use reader::TermIndexReader;
pub use record::{TermEntry, TermRecord};
