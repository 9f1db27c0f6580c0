//! Strand canonicalization of short base strings.
//!
//! A k-mer and its reverse complement describe the same double-stranded
//! locus, so both collapse onto whichever of the two sorts first.

use std::fmt;

use crate::error::{InvalidBaseError, KmerLengthError};

/// Bases enumerated when building the k-mer index.
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Smallest supported k-mer length.
pub const MIN_K: usize = 1;

/// Largest supported k-mer length. The index holds all 4^k k-mers.
pub const MAX_K: usize = 10;

/// A validated k-mer length in `MIN_K..=MAX_K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KmerLength(usize);

impl KmerLength {
    /// Validates `k`.
    ///
    /// # Errors
    ///
    /// Returns [`KmerLengthError`] if `k` is outside `MIN_K..=MAX_K`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kmersig::kmer::KmerLength;
    ///
    /// let k = KmerLength::new(4)?;
    /// assert_eq!(k.get(), 4);
    /// assert!(KmerLength::new(0).is_err());
    /// # Ok::<(), kmersig::error::KmerLengthError>(())
    /// ```
    pub fn new(k: usize) -> Result<Self, KmerLengthError> {
        if (MIN_K..=MAX_K).contains(&k) {
            Ok(Self(k))
        } else {
            Err(KmerLengthError {
                k,
                min: MIN_K,
                max: MAX_K,
            })
        }
    }

    /// Returns the length as a `usize`.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Number of distinct k-mers over `BASES`, i.e. 4^k.
    #[must_use]
    pub const fn kmer_space(self) -> usize {
        1 << (2 * self.0)
    }
}

impl fmt::Display for KmerLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for KmerLength {
    type Error = KmerLengthError;

    fn try_from(k: usize) -> Result<Self, Self::Error> {
        Self::new(k)
    }
}

/// Complement of a single base, including IUPAC ambiguity codes in either case.
///
/// `N` and other symbols without a defined pairing are rejected; the
/// returned error has `position` 0.
pub fn complement(base: u8) -> Result<u8, InvalidBaseError> {
    let paired = match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'M' => b'K',
        b'K' => b'M',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'r' => b'y',
        b'y' => b'r',
        b'm' => b'k',
        b'k' => b'm',
        b'b' => b'v',
        b'v' => b'b',
        b'd' => b'h',
        b'h' => b'd',
        _ => return Err(InvalidBaseError { base, position: 0 }),
    };
    Ok(paired)
}

/// Reverse complement of `seq`.
///
/// # Errors
///
/// Returns [`InvalidBaseError`] naming the first base (by position in `seq`)
/// that has no complement.
pub fn reverse_complement(seq: &[u8]) -> Result<Vec<u8>, InvalidBaseError> {
    let mut rc = seq
        .iter()
        .enumerate()
        .map(|(position, &base)| {
            complement(base).map_err(|err| InvalidBaseError { position, ..err })
        })
        .collect::<Result<Vec<u8>, _>>()?;
    rc.reverse();
    Ok(rc)
}

/// Lexicographically smaller of `seq` and its reverse complement.
///
/// # Errors
///
/// Returns [`InvalidBaseError`] if `seq` contains a base with no complement.
///
/// # Example
///
/// ```rust
/// use kmersig::kmer::canonical;
///
/// assert_eq!(canonical(b"TTT")?, b"AAA".to_vec());
/// assert_eq!(canonical(b"ACG")?, b"ACG".to_vec());
/// assert!(canonical(b"ANT").is_err());
/// # Ok::<(), kmersig::error::InvalidBaseError>(())
/// ```
pub fn canonical(seq: &[u8]) -> Result<Vec<u8>, InvalidBaseError> {
    let rc = reverse_complement(seq)?;
    if seq <= rc.as_slice() {
        Ok(seq.to_vec())
    } else {
        Ok(rc)
    }
}
