// repclass: repeat-family classification of sequencing reads
//
// Builds a compact in-memory index assigning every canonical k-mer of a
// reference's repeat annotation the LCA of the families it occurs in, then
// classifies reads by folding their k-mer hits through the class tree.

#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod constants;
pub mod encoding;
pub mod error;
pub mod kmer;
pub mod minimizer;
pub mod class_tree;
pub mod reference;
pub mod builder;
pub mod index;
pub mod repeat_index;
pub mod classify;
pub mod dump;
pub mod verify;

// Re-export the common types at the crate root
pub use builder::{BuildConfig, RepeatIndexBuilder};
pub use class_tree::{ClassNode, ClassTree};
pub use classify::{classify_stream, PipelineConfig, ReadClassification};
pub use error::{Error, Result};
pub use index::KmerIndex;
pub use reference::{Match, RefGenome, Repeat, Repeats};
pub use repeat_index::RepeatIndex;

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}
