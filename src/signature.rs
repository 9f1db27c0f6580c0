//! Per-sequence genomic signatures.
//!
//! A signature is the frequency of every canonical k-mer in a sequence,
//! normalized to sum to one, laid out in [`KmerIndex`] column order.

use serde::{Deserialize, Serialize};

use crate::{error::SignatureError, index::KmerIndex};

/// Raw canonical k-mer tallies for one sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerCounts {
    counts: Vec<u64>,
    skipped: usize,
}

impl KmerCounts {
    /// Tallies per column.
    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of windows that matched a column.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of windows skipped because they matched no column.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Normalizes the tallies into a [`Signature`].
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Degenerate`] if no window was counted.
    #[allow(clippy::cast_precision_loss)]
    pub fn normalize(self) -> Result<Signature, SignatureError> {
        let total = self.total();
        if total == 0 {
            return Err(SignatureError::Degenerate {
                windows: self.skipped,
            });
        }
        let total = total as f64;
        Ok(Signature(
            self.counts.iter().map(|&c| c as f64 / total).collect(),
        ))
    }
}

/// Slides a window of length k over `bases`, tallying each window's column.
///
/// Windows without a column (ambiguity codes, lowercase bases, any other
/// symbol) are skipped and counted in [`KmerCounts::skipped`].
#[must_use]
pub fn count_kmers(bases: &[u8], index: &KmerIndex) -> KmerCounts {
    let mut counts = vec![0u64; index.len()];
    let mut skipped = 0;

    for window in bases.windows(index.k().get()) {
        match index.class_of(window) {
            Some(column) => counts[column] += 1,
            None => skipped += 1,
        }
    }

    KmerCounts { counts, skipped }
}

/// Computes the normalized signature of `bases`.
///
/// # Errors
///
/// Returns [`SignatureError::Degenerate`] when the sequence is shorter than
/// k or none of its windows holds a countable k-mer.
///
/// # Example
///
/// ```rust
/// use kmersig::index::KmerIndex;
/// use kmersig::kmer::KmerLength;
/// use kmersig::signature::extract;
///
/// let index = KmerIndex::build(KmerLength::new(2)?)?;
/// let sig = extract(b"ACGT", &index)?;
/// assert!((sig.sum() - 1.0).abs() < 1e-12);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn extract(bases: &[u8], index: &KmerIndex) -> Result<Signature, SignatureError> {
    count_kmers(bases, index).normalize()
}

/// A normalized canonical k-mer frequency vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(Vec<f64>);

impl Signature {
    /// Frequencies in column order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the signature has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all frequencies; 1.0 up to rounding for extracted signatures.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Manhattan (L1) distance to `other`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::LengthMismatch`] if the signatures were
    /// built for different k.
    pub fn manhattan_distance(&self, other: &Signature) -> Result<f64, SignatureError> {
        if self.len() != other.len() {
            return Err(SignatureError::LengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .sum())
    }

    /// Consumes the signature and returns the frequencies.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for Signature {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}
