//! Base composition of a sequence.

/// Counts of the four nucleotides, case-insensitive. `U` is counted as `T`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseCounts {
    pub a: u64,
    pub c: u64,
    pub g: u64,
    pub t: u64,
}

impl BaseCounts {
    /// Tallies the bases of `seq`; all other symbols are ignored.
    #[must_use]
    pub fn from_seq(seq: &[u8]) -> Self {
        seq.iter().fold(Self::default(), |mut acc, base| {
            match base.to_ascii_uppercase() {
                b'A' => acc.a += 1,
                b'C' => acc.c += 1,
                b'G' => acc.g += 1,
                b'T' | b'U' => acc.t += 1,
                _ => {}
            }
            acc
        })
    }

    /// Number of counted bases.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.a + self.c + self.g + self.t
    }
}

/// Fraction of `A`/`C`/`G`/`T` bases that are `G` or `C`.
///
/// `None` if `seq` holds no countable base.
///
/// ```rust
/// use kmersig::composition::gc_content;
///
/// assert_eq!(gc_content(b"GGCA"), Some(0.75));
/// assert_eq!(gc_content(b"NNN"), None);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gc_content(seq: &[u8]) -> Option<f64> {
    let counts = BaseCounts::from_seq(seq);
    match counts.total() {
        0 => None,
        total => Some((counts.g + counts.c) as f64 / total as f64),
    }
}
