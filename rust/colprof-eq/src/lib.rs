//! Equivalence-class compression of term indexes.
//!
//! Terms occurring in exactly the same columns (optionally with the same
//! counts) are grouped into one equivalence class. Classes are the unit of all
//! downstream overlap and similarity analyses.

pub mod class;
pub mod compressor;
pub mod index;
pub mod sharded;
pub mod signature;

pub use class::{ClassBuilder, ClassFormat, EquivalenceClass, read_classes};
pub use compressor::{
    CompressionSummary, CompressorConfig, EquivalenceClassCompressor, TermSource, compress,
    compress_file, compress_source, write_classes,
};
pub use index::{ClassStats, EquivalenceClassIndex};
pub use sharded::{ShardedCompressorConfig, compress_file_sharded, compress_sharded};
pub use signature::Signature;
