//! Error types for index construction and output
//!
//! Anything that invalidates the index fails fast with one of these kinds;
//! local, data-dependent events (ambiguous windows, lookup misses) are
//! handled in place and never surface as errors.

use std::path::PathBuf;
use thiserror::Error;

/// Library-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by the build and output paths
#[derive(Error, Debug)]
pub enum Error {
    /// A required input file or directory is absent or unreadable
    #[error("missing input {}: {source}", .path.display())]
    InputMissing {
        /// Path that could not be read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Parse failure in a reference or annotation file
    #[error("malformed input {} at line {line} (byte {offset}): {msg}", .path.display())]
    InputMalformed {
        /// File containing the bad record
        path: PathBuf,
        /// 1-based line number of the failure
        line: usize,
        /// Byte offset of the offending line
        offset: usize,
        /// What went wrong
        msg: String,
    },

    /// k/m out of range, or m > k
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Allocation failure or a table outgrowing its ID space
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// I/O failure writing the dump or JSON tree
    #[error("output failure: {0}")]
    Output(#[from] std::io::Error),
}
