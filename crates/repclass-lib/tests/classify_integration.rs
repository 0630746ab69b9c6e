//! End-to-end tests of the build and classification pipeline
//!
//! These exercise the full path from reference model and match list through
//! aggregation, index packing, and read classification.

use std::sync::Arc;

use repclass_lib::{
    classify_stream, BuildConfig, Match, PipelineConfig, RefGenome, RepeatIndex,
    RepeatIndexBuilder,
};

fn make_match(contig: &str, start: u64, end: u64, class: &str, ty: &str, id: u64) -> Match {
    Match {
        seq_name: contig.to_string(),
        seq_start: start,
        seq_end: end,
        is_complement: false,
        repeat_type: ty.to_string(),
        repeat_class: class.to_string(),
        instance_id: id,
        class_id: 0,
    }
}

fn build_index(
    contigs: &[(&str, &str)],
    matches: Vec<Match>,
    k: usize,
    m: usize,
) -> RepeatIndex {
    let mut genome = RefGenome::new("toy");
    for (name, seq) in contigs {
        genome.insert_contig(*name, *name, seq.as_bytes().to_vec());
    }
    let config = BuildConfig { k, m, threads: 1, ..BuildConfig::default() };
    RepeatIndexBuilder::new(config).unwrap().build_from_parts(genome, matches).unwrap()
}

#[test]
fn single_instance_classifies_its_reads() {
    let index = build_index(
        &[("chr1", "ACGTACGT")],
        vec![make_match("chr1", 0, 8, "A", "B", 1)],
        4,
        2,
    );

    // every k-mer of the span carries the instance's class
    for rec in index.kmers().records() {
        assert_eq!(index.tree().node(rec.lca_id()).name, "A/B");
    }

    assert_eq!(index.classify(b"ACGTACGT").unwrap().name, "A/B");
    assert!(index.classify(b"AAAAA").is_none());
}

#[test]
fn sibling_instances_fold_to_their_parent() {
    let index = build_index(
        &[("chr1", "ACGTACGT")],
        vec![
            make_match("chr1", 0, 8, "A", "B", 1),
            make_match("chr1", 0, 8, "A", "C", 2),
        ],
        4,
        2,
    );

    for rec in index.kmers().records() {
        assert_eq!(index.tree().node(rec.lca_id()).name, "A");
    }
    assert_eq!(index.classify(b"ACGTACGT").unwrap().name, "A");
}

#[test]
fn ambiguous_bases_leave_holes_in_the_table() {
    let index = build_index(
        &[("chr1", "acgtNacgta")],
        vec![make_match("chr1", 0, 10, "X", "Y", 1)],
        4,
        2,
    );

    // Windows touching the N are undefined; the survivors are the two
    // distinct canonical words of acgt/acgt/cgta.
    assert_eq!(index.kmers().len(), 2);
    for rec in index.kmers().records() {
        assert_eq!(index.tree().node(rec.lca_id()).name, "X/Y");
    }
    assert_eq!(index.classify(b"acgta").unwrap().name, "X/Y");
}

#[test]
fn reverse_strand_instance_matches_forward_reads() {
    let forward = build_index(
        &[("chr1", "AAAAAAAACCCC")],
        vec![make_match("chr1", 0, 12, "X", "Y", 1)],
        5,
        3,
    );
    let mut rev = make_match("chr1", 0, 12, "X", "Y", 1);
    rev.is_complement = true;
    let reverse = build_index(&[("chr1", "AAAAAAAACCCC")], vec![rev], 5, 3);

    // canonicalization collapses the strands to the same k-mer set
    let fwd_words: Vec<u64> = forward.kmers().records().iter().map(|r| r.word()).collect();
    let rev_words: Vec<u64> = reverse.kmers().records().iter().map(|r| r.word()).collect();
    assert_eq!(fwd_words, rev_words);

    assert_eq!(reverse.classify(b"AAAAAAAACCCC").unwrap().name, "X/Y");
}

#[test]
fn conflicting_evidence_reduces_to_unclassified() {
    let index = build_index(
        &[("chr1", "ACGTACGT"), ("chr2", "GGTTGGTT")],
        vec![
            make_match("chr1", 0, 8, "A/B", "C", 1),
            make_match("chr2", 0, 8, "D", "E", 2),
        ],
        4,
        2,
    );

    // each span alone classifies to its own subtree
    assert_eq!(index.classify(b"ACGTACGT").unwrap().name, "A/B/C");
    assert_eq!(index.classify(b"GGTTGGTT").unwrap().name, "D/E");

    // a read straddling both resolves to the root: unclassified
    assert!(index.classify(b"ACGTACGTGGTTGGTT").is_none());
}

#[test]
fn short_and_empty_reads_are_unclassified() {
    let index = build_index(
        &[("chr1", "ACGTACGT")],
        vec![make_match("chr1", 0, 8, "A", "B", 1)],
        4,
        2,
    );
    assert!(index.classify(b"").is_none());
    assert!(index.classify(b"ACG").is_none());
}

#[test]
fn pipeline_matches_direct_classification() {
    let index = Arc::new(build_index(
        &[("chr1", "ACGTACGTACGTACGT")],
        vec![make_match("chr1", 0, 16, "LINE", "L1", 1)],
        5,
        3,
    ));

    let reads: Vec<Vec<u8>> = vec![
        b"ACGTACGTAC".to_vec(),
        b"TTTTTTTTTT".to_vec(),
        b"CGTACGTACG".to_vec(),
        b"NNNNNNNNNN".to_vec(),
    ];

    let config = PipelineConfig { workers: 2, channel_capacity: 2 };
    let results: Vec<_> =
        classify_stream(Arc::clone(&index), reads.clone(), &config).iter().collect();

    assert_eq!(results.len(), reads.len());
    for result in results {
        let expected = index.classify(&result.read).map(|n| n.id);
        assert_eq!(result.class_id, expected);
    }
}

#[test]
fn build_from_files_end_to_end() {
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let genome_dir = dir.path().join("toy");
    std::fs::create_dir(&genome_dir).unwrap();

    let mut fa = std::fs::File::create(genome_dir.join("chr1.fa")).unwrap();
    writeln!(fa, ">chr1").unwrap();
    writeln!(fa, "ACGTACGT").unwrap();
    writeln!(fa, "ACGTACGT").unwrap();

    let mut out = std::fs::File::create(genome_dir.join("toy.fa.out")).unwrap();
    writeln!(out, "   SW   perc perc perc  query    position in query").unwrap();
    writeln!(out, "score   div. del. ins.  sequence begin end").unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "  463 11.5  0.3  0.7  chr1  1  16  (0)  +  L1ME1  LINE/L1  123  581  (0)  1"
    )
    .unwrap();

    let config = BuildConfig { k: 4, m: 2, threads: 1, ..BuildConfig::default() };
    let index = RepeatIndexBuilder::new(config).unwrap().build(&genome_dir).unwrap();

    assert_eq!(index.name(), "toy");
    assert_eq!(index.matches().len(), 1);
    assert!(index.tree().get("LINE/L1/L1ME1").is_some());
    assert_eq!(index.classify(b"ACGTACGTACGT").unwrap().name, "LINE/L1/L1ME1");
}
