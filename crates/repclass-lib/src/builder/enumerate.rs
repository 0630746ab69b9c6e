//! K-mer enumeration over repeat instances
//!
//! For each repeat instance, slides a k-wide window one base at a time over
//! the clipped span and yields the canonical word of every window free of
//! ambiguity letters. The window rolls: each valid base shifts into the
//! running word, and an ambiguous byte resets the run so no window spanning
//! it is ever produced. Enumeration is lazy; the aggregator drains it.
//!
//! Strand handling: canonicalization already collapses the two strands, so
//! a reverse-strand instance contributes exactly the k-mer set its
//! forward-strand slice does, and the `C` flag needs no special casing.

use crate::encoding::encode_base;
use crate::kmer::{canonical, word_mask};
use crate::reference::{Match, RefGenome};

/// Iterator over the canonical words of every unambiguous k-window of a slice
pub struct KmerWindows<'a> {
    seq: &'a [u8],
    k: usize,
    mask: u64,
    word: u64,
    run: usize,
    pos: usize,
}

impl<'a> KmerWindows<'a> {
    /// Windows of length `k` over `seq`
    pub fn new(seq: &'a [u8], k: usize) -> Self {
        debug_assert!(crate::constants::is_valid_k(k));
        Self { seq, k, mask: word_mask(k), word: 0, run: 0, pos: 0 }
    }
}

impl Iterator for KmerWindows<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        while self.pos < self.seq.len() {
            let base = self.seq[self.pos];
            self.pos += 1;
            match encode_base(base) {
                Some(code) => {
                    self.word = ((self.word << 2) | code as u64) & self.mask;
                    self.run += 1;
                    if self.run >= self.k {
                        return Some(canonical(self.word, self.k));
                    }
                }
                // Ambiguous byte: every window crossing it is undefined
                None => self.run = 0,
            }
        }
        None
    }
}

/// Canonical k-mers of one repeat instance, paired with its class ID
///
/// The instance span is clipped to the contig bounds first; an instance on
/// an unknown contig contributes nothing.
pub fn match_kmers<'a>(
    genome: &'a RefGenome,
    m: &Match,
    k: usize,
) -> impl Iterator<Item = (u64, u16)> + 'a {
    let class_id = m.class_id;
    let span = genome.contig(&m.seq_name).map_or(&[][..], |seq| {
        let start = (m.seq_start as usize).min(seq.len());
        let end = (m.seq_end as usize).min(seq.len());
        &seq[start..end]
    });
    KmerWindows::new(span, k).map(move |word| (word, class_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_kmer;
    use crate::reference::raw_match;

    fn words(seq: &[u8], k: usize) -> Vec<u64> {
        KmerWindows::new(seq, k).collect()
    }

    #[test]
    fn test_windows_slide_one_base() {
        let got = words(b"acgtac", 4);
        let want: Vec<u64> = [&b"acgt"[..], b"cgta", b"gtac"]
            .iter()
            .map(|w| canonical(encode_kmer(w).unwrap(), 4))
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_windows_skip_ambiguous() {
        // N at index 4: windows [1..5) through [4..8) are all undefined
        let got = words(b"acgtNacgta", 4);
        let want: Vec<u64> = [&b"acgt"[..], b"acgt", b"cgta"]
            .iter()
            .map(|w| canonical(encode_kmer(w).unwrap(), 4))
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_windows_all_ambiguous_or_short() {
        assert!(words(b"nnnnnn", 4).is_empty());
        assert!(words(b"acg", 4).is_empty());
        assert!(words(b"", 4).is_empty());
    }

    #[test]
    fn test_windows_are_canonical() {
        for word in words(b"ggttggttggtt", 5) {
            assert_eq!(word, canonical(word, 5));
        }
    }

    #[test]
    fn test_match_kmers_clips_to_contig() {
        let mut genome = RefGenome::new("toy");
        genome.insert_contig("chr1", "chr1", b"acgtacgt".to_vec());

        let mut m = raw_match("chr1".into(), 4, 100, false, "T".into(), "X".into(), 1);
        m.class_id = 7;
        let pairs: Vec<_> = match_kmers(&genome, &m, 4).collect();
        // clipped span is "acgt": one window
        assert_eq!(pairs, vec![(canonical(encode_kmer(b"acgt").unwrap(), 4), 7)]);

        let missing = raw_match("chrX".into(), 0, 8, false, "T".into(), "X".into(), 2);
        assert_eq!(match_kmers(&genome, &missing, 4).count(), 0);
    }

    #[test]
    fn test_match_kmers_reverse_strand_same_set() {
        let mut genome = RefGenome::new("toy");
        genome.insert_contig("chr1", "chr1", b"aaaaaaaacccc".to_vec());

        let mut fwd = raw_match("chr1".into(), 0, 12, false, "T".into(), "X".into(), 1);
        fwd.class_id = 3;
        let mut rev = fwd.clone();
        rev.is_complement = true;

        let fwd_words: Vec<_> = match_kmers(&genome, &fwd, 5).collect();
        let rev_words: Vec<_> = match_kmers(&genome, &rev, 5).collect();
        assert_eq!(fwd_words, rev_words);
    }
}
