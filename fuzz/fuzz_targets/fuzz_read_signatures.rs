//! Fuzz target for the tabular signature reader.
//!
//! Malformed input must produce an error, never a panic.

#![no_main]

use kmersig::output::read_signatures;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = read_signatures(data);
});
