//! # kmersig
//!
//! Canonical k-mer genomic signatures for DNA sequences.
//!
//! A genomic signature is the normalized frequency of every canonical k-mer
//! in a sequence. Because a k-mer and its reverse complement share a
//! column, signatures do not depend on which strand a sequence was read
//! from, and because they are normalized they do not depend on its length.
//!
//! # Example
//!
//! ```rust
//! use kmersig::index::KmerIndex;
//! use kmersig::kmer::KmerLength;
//! use kmersig::signature::extract;
//!
//! let index = KmerIndex::build(KmerLength::new(4)?)?;
//! let a = extract(b"GATTACAGATTACAGATTACA", &index)?;
//! let b = extract(b"TGTAATCTGTAATCTGTAATC", &index)?;
//! assert_eq!(a.manhattan_distance(&b)?, 0.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! For whole files, see [`builder::SignatureCalculator`], which reads a FASTA
//! file and runs the parallel [`pipeline`].

pub mod builder;
pub mod cli;
pub mod composition;
pub mod error;
pub mod index;
pub mod kmer;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod reader;
pub mod signature;
