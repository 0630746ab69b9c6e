//! DNA nucleotide encoding
//!
//! Two-bit encoding of DNA bases:
//! - A (65/97)  -> 00
//! - C (67/99)  -> 01
//! - G (71/103) -> 10
//! - T (84/116) -> 11
//!
//! With this assignment the complement of a base is the bitwise NOT of its
//! two-bit code, which the word-level reverse complement relies on.
//! Any byte outside {a,c,g,t,A,C,G,T} (including `N`) makes the enclosing
//! k-mer undefined; callers skip such windows rather than erroring.

/// Encode a single DNA base to 2 bits, or `None` for an ambiguous byte
#[inline]
pub const fn encode_base(base: u8) -> Option<u8> {
    match base {
        b'A' | b'a' => Some(0b00),
        b'C' | b'c' => Some(0b01),
        b'G' | b'g' => Some(0b10),
        b'T' | b't' => Some(0b11),
        _ => None,
    }
}

/// Decode a 2-bit value to a lowercase DNA base
#[inline]
pub const fn decode_base(bits: u8) -> u8 {
    match bits & 0b11 {
        0b00 => b'a',
        0b01 => b'c',
        0b10 => b'g',
        _ => b't',
    }
}

/// Complement of an encoded base (A<->T, C<->G)
#[inline]
pub const fn complement_base(bits: u8) -> u8 {
    !bits & 0b11
}

/// Encode a k-mer into a 64-bit word in big-endian base order
///
/// The leftmost base lands in the highest-used bit pair. Returns `None` if
/// the slice is empty, longer than 32 bases, or contains an ambiguous byte.
/// No partial credit: one bad byte fails the whole k-mer.
#[inline]
pub fn encode_kmer(seq: &[u8]) -> Option<u64> {
    if seq.is_empty() || seq.len() > crate::constants::MAX_K {
        return None;
    }
    let mut word = 0u64;
    for &base in seq {
        word = (word << 2) | encode_base(base)? as u64;
    }
    Some(word)
}

/// Decode a 64-bit word back into `len` lowercase bases
pub fn decode_kmer(word: u64, len: usize) -> Vec<u8> {
    let mut seq = vec![0u8; len];
    fill_kmer(&mut seq, word);
    seq
}

/// Decode a word into a caller-provided buffer, one base per byte
///
/// The buffer length selects how many low bit pairs are decoded; the
/// leftmost base of the sequence comes from the highest of them.
pub fn fill_kmer(buf: &mut [u8], word: u64) {
    debug_assert!(buf.len() <= crate::constants::MAX_K);
    let len = buf.len();
    for (i, slot) in buf.iter_mut().enumerate() {
        let shift = 2 * (len - i - 1);
        *slot = decode_base((word >> shift) as u8);
    }
}
