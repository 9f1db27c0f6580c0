//! Fuzz target for signature extraction over arbitrary bytes.

#![no_main]

use kmersig::index::KmerIndex;
use kmersig::kmer::KmerLength;
use kmersig::signature::{count_kmers, extract};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&k, seq)) = data.split_first() else {
        return;
    };
    let Ok(k) = KmerLength::new(usize::from(k % 6) + 1) else {
        return;
    };
    let index = KmerIndex::build(k).unwrap();

    let counts = count_kmers(seq, &index);
    let windows = seq.len().saturating_sub(k.get() - 1);
    assert_eq!(counts.total() as usize + counts.skipped(), windows);

    if let Ok(sig) = extract(seq, &index) {
        assert_eq!(sig.len(), index.len());
        assert!((sig.sum() - 1.0).abs() < 1e-9);
    }
});
