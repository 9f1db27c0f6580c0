//! Builder pattern API for ergonomic signature computation.
//!
//! # Example
//!
//! ```rust,no_run
//! use kmersig::builder::SignatureCalculator;
//!
//! let signatures = SignatureCalculator::new()
//!     .k(4)?
//!     .workers(8)?
//!     .build()?;
//!
//! let report = signatures.calculate("genome.fa", "genome.tsv")?;
//! println!("{} signatures written", report.rows_written);
//!
//! let table = signatures.read("genome.tsv")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    collections::HashMap,
    fmt::Debug,
    fs::File,
    io::{self, BufWriter, Write},
    num::NonZeroUsize,
    path::Path,
    thread,
};

use tracing::info;

use crate::{
    cli::OutputFormat,
    error::{BuilderError, KmerSigError, SignatureError},
    index::KmerIndex,
    kmer::KmerLength,
    output::{read_signatures_path_as, SignatureSink},
    pipeline::{Pipeline, PipelineReport, SequenceRecord},
    progress::Progress,
    reader::read_fasta,
    signature::{extract, Signature},
};

/// A builder for configuring signature computation.
///
/// Use [`SignatureCalculator::new()`] to create a new builder, configure it
/// with the fluent API, then call [`build()`](SignatureCalculator::build).
#[derive(Debug, Clone)]
pub struct SignatureCalculator {
    k: Option<KmerLength>,
    workers: usize,
    queue_capacity: Option<usize>,
    format: OutputFormat,
}

impl Default for SignatureCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureCalculator {
    /// Creates a new builder with default settings.
    ///
    /// Default settings:
    /// - `k`: None (must be set before building)
    /// - `workers`: available parallelism
    /// - `queue_capacity`: unbounded
    /// - `format`: TSV
    #[must_use]
    pub fn new() -> Self {
        Self {
            k: None,
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            queue_capacity: None,
            format: OutputFormat::Tsv,
        }
    }

    /// Sets the k-mer length.
    ///
    /// # Errors
    ///
    /// Returns [`KmerLengthError`](crate::error::KmerLengthError) if `k` is
    /// outside the valid range.
    pub fn k(mut self, k: usize) -> Result<Self, BuilderError> {
        self.k = Some(KmerLength::new(k)?);
        Ok(self)
    }

    /// Sets the k-mer length from a pre-validated `KmerLength`.
    #[must_use]
    pub fn k_validated(mut self, k: KmerLength) -> Self {
        self.k = Some(k);
        self
    }

    /// Sets the number of worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`KmerSigError::InvalidWorkerCount`] if `workers` is zero.
    pub fn workers(mut self, workers: usize) -> Result<Self, BuilderError> {
        if workers == 0 {
            return Err(KmerSigError::InvalidWorkerCount { workers }.into());
        }
        self.workers = workers;
        Ok(self)
    }

    /// Bounds the pipeline queues.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Builds the k-mer index.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::KmerLengthNotSet`] if `k` has not been set.
    pub fn build(self) -> Result<GenomicSignatures, BuilderError> {
        let k = self.k.ok_or(BuilderError::KmerLengthNotSet)?;
        let index = KmerIndex::build(k)?;
        Ok(GenomicSignatures {
            index,
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            format: self.format,
        })
    }
}

/// Genomic signature calculator holding a built [`KmerIndex`].
#[derive(Debug, Clone)]
pub struct GenomicSignatures {
    index: KmerIndex,
    workers: usize,
    queue_capacity: Option<usize>,
    format: OutputFormat,
}

impl GenomicSignatures {
    /// The shared k-mer index.
    #[must_use]
    pub fn index(&self) -> &KmerIndex {
        &self.index
    }

    /// Canonical k-mers in column order.
    #[must_use]
    pub fn kmer_columns(&self) -> &[String] {
        self.index.columns()
    }

    /// Signature of a single sequence.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Degenerate`] if no k-mer could be counted.
    pub fn signature(&self, bases: &[u8]) -> Result<Signature, SignatureError> {
        extract(bases, &self.index)
    }

    /// Manhattan distance between two signatures.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::LengthMismatch`] for signatures of
    /// different k.
    pub fn distance(&self, a: &Signature, b: &Signature) -> Result<f64, SignatureError> {
        a.manhattan_distance(b)
    }

    /// Computes signatures for every sequence in the FASTA file at `input`
    /// and writes them to `output`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or is empty, or the
    /// output cannot be written.
    pub fn calculate<P, Q>(&self, input: P, output: Q) -> Result<PipelineReport, KmerSigError>
    where
        P: AsRef<Path> + Debug,
        Q: AsRef<Path>,
    {
        self.calculate_with_progress(input, output, |_| {})
    }

    /// Like [`calculate`](Self::calculate), invoking `callback` after each
    /// finished sequence.
    ///
    /// # Errors
    ///
    /// As [`calculate`](Self::calculate).
    pub fn calculate_with_progress<P, Q, F>(
        &self,
        input: P,
        output: Q,
        callback: F,
    ) -> Result<PipelineReport, KmerSigError>
    where
        P: AsRef<Path> + Debug,
        Q: AsRef<Path>,
        F: Fn(Progress) + Sync,
    {
        let output = output.as_ref();
        let (report, _) = self.calculate_into(
            input,
            || File::create(output).map(BufWriter::new),
            callback,
        )?;
        Ok(report)
    }

    /// Computes signatures for every sequence in the FASTA file at `input`
    /// and streams them to the writer returned by `open_output`.
    ///
    /// `open_output` is only called once the input is known to hold at least
    /// one sequence, so a failed run never truncates an existing output file.
    ///
    /// # Errors
    ///
    /// Returns [`KmerSigError::EmptyInput`] without opening the output if the
    /// file holds no sequences, otherwise as
    /// [`calculate_to_writer`](Self::calculate_to_writer).
    pub fn calculate_into<P, O, W, F>(
        &self,
        input: P,
        open_output: O,
        callback: F,
    ) -> Result<(PipelineReport, W), KmerSigError>
    where
        P: AsRef<Path> + Debug,
        O: FnOnce() -> io::Result<W>,
        W: Write + Send,
        F: Fn(Progress) + Sync,
    {
        info!(path = ?input, "Calculating genomic signatures for sequences in file");
        let records = read_fasta(&input)?;
        if records.is_empty() {
            return Err(KmerSigError::EmptyInput);
        }
        let writer = open_output()?;
        self.calculate_to_writer(records, writer, callback)
    }

    /// Computes signatures for `records` and streams them to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`KmerSigError::EmptyInput`] for no records, or the writer's
    /// error.
    pub fn calculate_to_writer<W, F>(
        &self,
        records: Vec<SequenceRecord>,
        writer: W,
        callback: F,
    ) -> Result<(PipelineReport, W), KmerSigError>
    where
        W: Write + Send,
        F: Fn(Progress) + Sync,
    {
        if records.is_empty() {
            return Err(KmerSigError::EmptyInput);
        }
        let mut pipeline = Pipeline::new(&self.index, self.workers)?;
        if let Some(capacity) = self.queue_capacity {
            pipeline = pipeline.queue_capacity(capacity);
        }
        let sink = SignatureSink::new(writer, self.format, self.index.columns())?;
        pipeline.run_with_progress(records, sink, callback)
    }

    /// Reads back a signature file written in this calculator's output
    /// format.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<HashMap<String, Signature>, KmerSigError> {
        read_signatures_path_as(path, self.format)
    }
}
