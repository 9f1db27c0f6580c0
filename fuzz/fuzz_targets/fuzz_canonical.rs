//! Fuzz target for canonical k-mer computation.
//!
//! Checks that the canonical form is idempotent, shared with the reverse
//! complement and never larger than either orientation.

#![no_main]

use kmersig::kmer::{canonical, reverse_complement};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(canon) = canonical(data) else {
        // Anything rejected here must also be rejected for the reverse strand.
        assert!(reverse_complement(data).is_err());
        return;
    };
    let rc = reverse_complement(data).unwrap();

    assert_eq!(canonical(&canon).unwrap(), canon, "Canonical is not idempotent");
    assert_eq!(
        canonical(&rc).unwrap(),
        canon,
        "k-mer and RC have different canonical forms"
    );
    assert!(canon.as_slice() <= data, "Canonical > input");
    assert!(canon <= rc, "Canonical > RC");
    assert_eq!(reverse_complement(&rc).unwrap(), data);
});
