//! Error types for kmersig.
//!
//! Batch-level problems (bad configuration, unreadable input, a failing output
//! sink) surface as [`KmerSigError`]. Problems confined to a single sequence
//! surface as [`SignatureError`] and never abort a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in kmersig operations.
#[derive(Debug, Error)]
pub enum KmerSigError {
    /// K-mer length is outside the valid range.
    #[error("invalid k-mer length {k}: must be between {min} and {max}")]
    InvalidKmerLength { k: usize, min: usize, max: usize },

    /// A base outside the complement alphabet was canonicalized.
    #[error("unsupported character '{base}' at position {position}")]
    UnsupportedCharacter { base: char, position: usize },

    /// Worker count must be at least one.
    #[error("invalid worker count {workers}: at least one worker is required")]
    InvalidWorkerCount { workers: usize },

    /// The input contained no sequences.
    #[error("no sequences to process")]
    EmptyInput,

    /// Failed to read sequence file.
    #[error("failed to read sequence file '{path}': {source}")]
    SequenceRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to parse sequence record.
    #[error("failed to parse sequence record in '{path}': {details}")]
    SequenceParse { details: String, path: PathBuf },

    /// Failed to read a signature file back.
    #[error("failed to read signature file '{path}': {source}")]
    SignatureRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// A row of a signature file could not be parsed.
    #[error("malformed signature row at line {line}: {details}")]
    ParseSignature { line: usize, details: String },

    /// Failed to write output.
    #[error("failed to write output: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize JSON output.
    #[error("failed to serialize JSON: {source}")]
    JsonError {
        #[source]
        source: serde_json::Error,
    },

    /// A pipeline thread terminated without reporting back.
    #[error("pipeline {role} thread panicked")]
    ThreadPanic { role: &'static str },
}

/// Error for invalid k-mer length.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("k-mer length {k} is out of range: must be between {min} and {max}")]
pub struct KmerLengthError {
    /// The invalid k value that was provided.
    pub k: usize,
    /// Minimum valid k-mer length.
    pub min: usize,
    /// Maximum valid k-mer length.
    pub max: usize,
}

/// Error for a base with no defined complement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBaseError {
    /// The invalid byte value.
    pub base: u8,
    /// Position of the invalid byte in the sequence.
    pub position: usize,
}

impl std::fmt::Display for InvalidBaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.base.is_ascii_graphic() || self.base == b' ' {
            write!(
                f,
                "invalid base '{}' (0x{:02x}) at position {}",
                self.base as char, self.base, self.position
            )
        } else {
            write!(
                f,
                "invalid base 0x{:02x} at position {}",
                self.base, self.position
            )
        }
    }
}

impl std::error::Error for InvalidBaseError {}

/// Per-sequence failures.
///
/// These are attributed to a single sequence and reported alongside the
/// batch results rather than aborting it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SignatureError {
    /// No window of the sequence matched a canonical k-mer, so the
    /// frequencies cannot be normalized.
    #[error("degenerate signature: none of {windows} windows contained a countable k-mer")]
    Degenerate { windows: usize },

    /// Two signatures built for different k-mer lengths were compared.
    #[error("signature length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    /// A worker failed while processing a sequence.
    #[error("worker failed on sequence '{id}': {cause}")]
    WorkerFailure { id: String, cause: String },
}

impl From<std::io::Error> for KmerSigError {
    fn from(source: std::io::Error) -> Self {
        KmerSigError::WriteError { source }
    }
}

impl From<serde_json::Error> for KmerSigError {
    fn from(source: serde_json::Error) -> Self {
        KmerSigError::JsonError { source }
    }
}

impl From<KmerLengthError> for KmerSigError {
    fn from(err: KmerLengthError) -> Self {
        KmerSigError::InvalidKmerLength {
            k: err.k,
            min: err.min,
            max: err.max,
        }
    }
}

impl From<InvalidBaseError> for KmerSigError {
    fn from(err: InvalidBaseError) -> Self {
        KmerSigError::UnsupportedCharacter {
            base: char::from(err.base),
            position: err.position,
        }
    }
}

/// Errors that can occur when using the builder API.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// K-mer length was not set before building.
    #[error("k-mer length not set; call .k() first")]
    KmerLengthNotSet,

    /// Invalid k-mer length provided.
    #[error(transparent)]
    KmerLength(#[from] KmerLengthError),

    /// Error building the index or running the pipeline.
    #[error(transparent)]
    KmerSig(#[from] KmerSigError),

    /// Error comparing signatures.
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kmer_length_error_display() {
        let err = KmerLengthError {
            k: 50,
            min: 1,
            max: 10,
        };
        assert_eq!(
            err.to_string(),
            "k-mer length 50 is out of range: must be between 1 and 10"
        );
    }

    #[test]
    fn invalid_base_error_display() {
        let err = InvalidBaseError {
            base: b'N',
            position: 5,
        };
        assert_eq!(err.to_string(), "invalid base 'N' (0x4e) at position 5");
    }

    #[test]
    fn invalid_base_error_display_non_printable() {
        let err = InvalidBaseError {
            base: 0x07,
            position: 0,
        };
        assert_eq!(err.to_string(), "invalid base 0x07 at position 0");
    }

    #[test]
    fn kmersig_error_from_kmer_length_error() {
        let err: KmerSigError = KmerLengthError {
            k: 0,
            min: 1,
            max: 10,
        }
        .into();
        assert!(matches!(err, KmerSigError::InvalidKmerLength { k: 0, .. }));
    }

    #[test]
    fn kmersig_error_from_invalid_base_error() {
        let err: KmerSigError = InvalidBaseError {
            base: b'X',
            position: 3,
        }
        .into();
        assert!(matches!(
            err,
            KmerSigError::UnsupportedCharacter {
                base: 'X',
                position: 3
            }
        ));
        assert_eq!(err.to_string(), "unsupported character 'X' at position 3");
    }

    #[test]
    fn worker_failure_names_sequence() {
        let err = SignatureError::WorkerFailure {
            id: "contig_7".to_string(),
            cause: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "worker failed on sequence 'contig_7': boom");
    }
}
