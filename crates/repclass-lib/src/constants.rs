//! Constants shared across the library
//!
//! Defaults and bounds for k-mer and minimizer lengths, plus the sentinel
//! values used by the class tree.

/// Default k-mer length
pub const DEFAULT_K: usize = 31;

/// Default minimizer length
pub const DEFAULT_M: usize = 15;

/// Maximum supported k-mer length (two-bit packing into a single u64)
pub const MAX_K: usize = 32;

/// Minimum supported k-mer length
pub const MIN_K: usize = 1;

/// Class ID of the synthetic root node
pub const ROOT_ID: u16 = 0;

/// Name of the synthetic root node
pub const ROOT_NAME: &str = "root";

/// Size in bytes of one packed k-mer record (8-byte word + 2-byte class ID)
pub const KMER_RECORD_BYTES: usize = 10;

/// Default capacity of the bounded channels in the classification pipeline
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Version number
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Check whether a k-mer length fits in a two-bit-packed u64
#[inline]
pub const fn is_valid_k(k: usize) -> bool {
    k >= MIN_K && k <= MAX_K
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_k_bounds() {
        assert!(!is_valid_k(0));
        assert!(is_valid_k(1));
        assert!(is_valid_k(31));
        assert!(is_valid_k(32));
        assert!(!is_valid_k(33));
    }
}
