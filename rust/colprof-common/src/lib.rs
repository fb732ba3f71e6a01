//! Core definitions shared by all colprof-* crates: the error model, column
//! frequency lists and the line-oriented file helpers used by every index file.

pub mod column_counts;
pub mod error;
pub mod fs;
pub mod macros;
pub mod records;
pub mod result;

pub use column_counts::{ColumnFrequencies, ColumnId};
pub use result::Result;

/// Identifier of a term in a finished term index.
pub type TermId = u64;

/// Identifier of an equivalence class.
pub type ClassId = u64;
