//! Canonical k-mer index.
//!
//! The index fixes the column order of every signature and maps each k-mer,
//! in either strand orientation, to its column.
//!
//! # Column order
//!
//! All 4^k k-mers over `ACGT` are enumerated lexicographically (rightmost
//! base varying fastest) and each is canonicalized. A canonical k-mer gets a
//! column the first time it is produced, so the order is stable for a given
//! k across runs and platforms.
//!
//! # Example
//!
//! ```rust
//! use kmersig::index::KmerIndex;
//! use kmersig::kmer::KmerLength;
//!
//! let index = KmerIndex::build(KmerLength::new(2)?)?;
//! assert_eq!(index.len(), 10);
//! assert_eq!(index.class_of(b"AC"), index.class_of(b"GT"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{
    error::KmerSigError,
    kmer::{canonical, reverse_complement, KmerLength, BASES},
};

/// Header label of the identifier column in tabular output.
pub const ID_COLUMN: &str = "Sequence Id";

/// Immutable mapping from k-mers to canonical signature columns.
#[derive(Debug, Clone)]
pub struct KmerIndex {
    k: KmerLength,
    columns: Vec<String>,
    class_of: FxHashMap<Vec<u8>, usize>,
}

impl KmerIndex {
    /// Builds the index for all k-mers of length `k`.
    ///
    /// # Errors
    ///
    /// Returns [`KmerSigError::UnsupportedCharacter`] if canonicalization
    /// fails, which cannot happen for the `ACGT` enumeration alphabet.
    pub fn build(k: KmerLength) -> Result<Self, KmerSigError> {
        let mut columns: Vec<String> = Vec::new();
        let mut class_of: FxHashMap<Vec<u8>, usize> = FxHashMap::default();

        for kmer in enumerate_kmers(k) {
            let canonical_kmer = canonical(&kmer)?;
            if class_of.contains_key(&canonical_kmer) {
                continue;
            }
            let column = columns.len();
            let rc = reverse_complement(&canonical_kmer)?;
            // Palindromes (even k only) register the same key twice.
            class_of.insert(rc, column);
            columns.push(String::from_utf8_lossy(&canonical_kmer).into_owned());
            class_of.insert(canonical_kmer, column);
        }

        debug!(
            k = k.get(),
            kmers = k.kmer_space(),
            columns = columns.len(),
            "Built canonical k-mer index"
        );

        Ok(Self {
            k,
            columns,
            class_of,
        })
    }

    /// Returns the k-mer length.
    #[must_use]
    pub const fn k(&self) -> KmerLength {
        self.k
    }

    /// Canonical k-mers in column order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns (canonical equivalence classes).
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the index has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column of the class containing `window`.
    ///
    /// `None` for windows holding anything other than uppercase `ACGT`, and
    /// for windows whose length differs from k.
    #[must_use]
    pub fn class_of(&self, window: &[u8]) -> Option<usize> {
        self.class_of.get(window).copied()
    }

    /// Header fields of the tabular output: the identifier column followed
    /// by every canonical k-mer.
    pub fn header(&self) -> impl Iterator<Item = &str> {
        std::iter::once(ID_COLUMN).chain(self.columns.iter().map(String::as_str))
    }
}

/// All k-mers over `BASES` in lexicographic order.
fn enumerate_kmers(k: KmerLength) -> impl Iterator<Item = Vec<u8>> {
    let k = k.get();
    (0..1usize << (2 * k)).map(move |rank| {
        (0..k)
            .rev()
            .map(|pos| BASES[(rank >> (2 * pos)) & 0b11])
            .collect()
    })
}

/// Number of canonical classes for length `k`: `(4^k + 4^(k/2)) / 2` for
/// even k, `4^k / 2` for odd k.
#[must_use]
pub fn canonical_class_count(k: KmerLength) -> usize {
    let k = k.get();
    let total = 1usize << (2 * k);
    if k % 2 == 0 {
        (total + (1usize << k)) / 2
    } else {
        total / 2
    }
}
