//! Concurrent signature computation.
//!
//! A fixed pool of worker threads pulls sequences off a shared work queue,
//! computes their signatures against a shared read-only [`KmerIndex`], and
//! pushes results onto a second queue drained by a single writer thread.
//!
//! # Shutdown protocol
//!
//! 1. The caller's thread dispatches every sequence, then one
//!    [`WorkItem::Stop`] per worker.
//! 2. Each worker exits on its `Stop`.
//! 3. Only after every worker thread has been joined is a single
//!    [`ResultItem::Stop`] sent to the writer, so no result can arrive after
//!    the writer has stopped.
//!
//! Rows are written in completion order, not input order.
//!
//! # Example
//!
//! ```rust
//! use kmersig::cli::OutputFormat;
//! use kmersig::index::KmerIndex;
//! use kmersig::kmer::KmerLength;
//! use kmersig::output::SignatureSink;
//! use kmersig::pipeline::{Pipeline, SequenceRecord};
//!
//! let index = KmerIndex::build(KmerLength::new(2)?)?;
//! let records = vec![
//!     SequenceRecord::new("seq1", "ACGTACGT"),
//!     SequenceRecord::new("seq2", "GATTACA"),
//! ];
//! let sink = SignatureSink::new(Vec::new(), OutputFormat::Tsv, index.columns())?;
//! let (report, out) = Pipeline::new(&index, 2)?.run(records, sink)?;
//! assert_eq!(report.rows_written, 2);
//! assert_eq!(String::from_utf8(out)?.lines().count(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    any::Any,
    io::Write,
    panic::{self, AssertUnwindSafe},
    thread,
};

use bytes::Bytes;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{debug, info, info_span, warn};

use crate::{
    error::{KmerSigError, SignatureError},
    index::KmerIndex,
    output::SignatureSink,
    progress::{Progress, ProgressTracker},
    signature::{extract, Signature},
};

/// Signature extraction as run by each worker.
pub type Extractor = fn(&[u8], &KmerIndex) -> Result<Signature, SignatureError>;

/// An identified sequence, already parsed from its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: String,
    pub bases: Bytes,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, bases: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            bases: bases.into(),
        }
    }
}

/// Message on the work queue.
#[derive(Debug)]
pub enum WorkItem {
    Sequence(SequenceRecord),
    /// No more work for the receiving worker.
    Stop,
}

/// Message on the results queue.
#[derive(Debug)]
pub enum ResultItem {
    Signature { id: String, signature: Signature },
    Failed { id: String, error: SignatureError },
    /// Every worker has finished.
    Stop,
}

/// A sequence that produced no row.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFailure {
    pub id: String,
    pub error: SignatureError,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    /// Rows written to the sink.
    pub rows_written: u64,
    /// Sequences left out because they had no countable k-mer.
    pub degenerate: Vec<String>,
    /// Sequences left out because their worker failed on them.
    pub failures: Vec<SequenceFailure>,
}

/// Parallel signature pipeline over a borrowed index.
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    index: &'a KmerIndex,
    workers: usize,
    queue_capacity: Option<usize>,
    extractor: Extractor,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline running `workers` worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`KmerSigError::InvalidWorkerCount`] if `workers` is zero.
    pub fn new(index: &'a KmerIndex, workers: usize) -> Result<Self, KmerSigError> {
        if workers == 0 {
            return Err(KmerSigError::InvalidWorkerCount { workers });
        }
        Ok(Self {
            index,
            workers,
            queue_capacity: None,
            extractor: extract,
        })
    }

    /// Bounds both queues to `capacity` messages. Queues are unbounded by
    /// default.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Replaces the per-sequence extraction step.
    #[must_use]
    pub fn extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Computes and writes a signature for every record.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run_with_progress`].
    pub fn run<I, W>(
        &self,
        records: I,
        sink: SignatureSink<W>,
    ) -> Result<(PipelineReport, W), KmerSigError>
    where
        I: IntoIterator<Item = SequenceRecord>,
        I::IntoIter: ExactSizeIterator,
        W: Write + Send,
    {
        self.run_with_progress(records, sink, |_| {})
    }

    /// Computes and writes a signature for every record, calling `progress`
    /// from the writer thread after each finished sequence.
    ///
    /// Per-sequence failures are collected in the returned report and do not
    /// stop the batch.
    ///
    /// # Errors
    ///
    /// Returns [`KmerSigError::EmptyInput`] before starting any thread if
    /// `records` is empty, the sink's error if writing fails, and
    /// [`KmerSigError::ThreadPanic`] if a pipeline thread dies.
    pub fn run_with_progress<I, W, F>(
        &self,
        records: I,
        sink: SignatureSink<W>,
        progress: F,
    ) -> Result<(PipelineReport, W), KmerSigError>
    where
        I: IntoIterator<Item = SequenceRecord>,
        I::IntoIter: ExactSizeIterator,
        W: Write + Send,
        F: Fn(Progress) + Sync,
    {
        let records = records.into_iter();
        let total = records.len();
        if total == 0 {
            return Err(KmerSigError::EmptyInput);
        }

        let _span = info_span!("pipeline", k = self.index.k().get(), workers = self.workers)
            .entered();
        info!(sequences = total, "Calculating genomic signatures");

        let (work_tx, work_rx) = channel::<WorkItem>(self.queue_capacity);
        let (result_tx, result_rx) = channel::<ResultItem>(self.queue_capacity);
        let tracker = ProgressTracker::new(total as u64);

        let (report, writer) = thread::scope(|scope| {
            let tracker = &tracker;
            let progress = &progress;
            let writer = scope.spawn(move || write_results(result_rx, sink, tracker, progress));

            let workers: Vec<_> = (0..self.workers)
                .map(|worker| {
                    let work_rx = work_rx.clone();
                    let result_tx = result_tx.clone();
                    let index = self.index;
                    let extractor = self.extractor;
                    scope.spawn(move || run_worker(worker, index, extractor, work_rx, result_tx))
                })
                .collect();
            drop(work_rx);

            let dispatched = dispatch(records, &work_tx, self.workers);
            drop(work_tx);
            debug!(dispatched, "Dispatched sequences");

            let mut worker_panicked = false;
            for handle in workers {
                worker_panicked |= handle.join().is_err();
            }

            // All workers are done; nothing else can reach the results queue.
            let _ = result_tx.send(ResultItem::Stop);
            drop(result_tx);

            let written = writer
                .join()
                .map_err(|_| KmerSigError::ThreadPanic { role: "writer" })?;
            if worker_panicked {
                return Err(KmerSigError::ThreadPanic { role: "worker" });
            }
            written
        })?;

        info!(
            rows = report.rows_written,
            degenerate = report.degenerate.len(),
            failed = report.failures.len(),
            "Genomic signatures complete"
        );

        Ok((report, writer))
    }
}

fn channel<T>(capacity: Option<usize>) -> (Sender<T>, Receiver<T>) {
    match capacity {
        Some(capacity) => bounded(capacity),
        None => unbounded(),
    }
}

/// Enqueues every record followed by one `Stop` per worker. Returns the
/// number of records enqueued, which falls short only if every worker has
/// already gone away.
fn dispatch<I>(records: I, work: &Sender<WorkItem>, workers: usize) -> usize
where
    I: Iterator<Item = SequenceRecord>,
{
    let mut dispatched = 0;
    for record in records {
        if work.send(WorkItem::Sequence(record)).is_err() {
            break;
        }
        dispatched += 1;
    }
    for _ in 0..workers {
        if work.send(WorkItem::Stop).is_err() {
            break;
        }
    }
    dispatched
}

// Both channel ends are dropped on return, which is what lets the other
// side observe shutdown.
#[allow(clippy::needless_pass_by_value)]
fn run_worker(
    worker: usize,
    index: &KmerIndex,
    extractor: Extractor,
    work: Receiver<WorkItem>,
    results: Sender<ResultItem>,
) {
    let mut processed = 0usize;

    while let Ok(item) = work.recv() {
        let record = match item {
            WorkItem::Sequence(record) => record,
            WorkItem::Stop => break,
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| extractor(&record.bases, index)));
        let message = match outcome {
            Ok(Ok(signature)) => ResultItem::Signature {
                id: record.id,
                signature,
            },
            Ok(Err(error)) => ResultItem::Failed {
                id: record.id,
                error,
            },
            Err(payload) => ResultItem::Failed {
                error: SignatureError::WorkerFailure {
                    id: record.id.clone(),
                    cause: panic_message(payload.as_ref()),
                },
                id: record.id,
            },
        };
        processed += 1;

        if results.send(message).is_err() {
            // writer has stopped on an error
            break;
        }
    }

    debug!(worker, processed, "Worker finished");
}

#[allow(clippy::needless_pass_by_value)]
fn write_results<W, F>(
    results: Receiver<ResultItem>,
    mut sink: SignatureSink<W>,
    tracker: &ProgressTracker,
    progress: &F,
) -> Result<(PipelineReport, W), KmerSigError>
where
    W: Write,
    F: Fn(Progress),
{
    let mut report = PipelineReport::default();

    while let Ok(item) = results.recv() {
        match item {
            ResultItem::Signature { id, signature } => {
                sink.write_row(&id, &signature)?;
                tracker.record_written();
            }
            ResultItem::Failed {
                id,
                error: SignatureError::Degenerate { windows },
            } => {
                warn!(id = %id, windows, "Skipping sequence without countable k-mers");
                report.degenerate.push(id);
                tracker.record_skipped();
            }
            ResultItem::Failed { id, error } => {
                warn!(id = %id, error = %error, "Failed to compute signature");
                report.failures.push(SequenceFailure { id, error });
                tracker.record_skipped();
            }
            ResultItem::Stop => break,
        }
        progress(tracker.snapshot());
    }

    report.rows_written = sink.rows();
    let writer = sink.finish()?;
    Ok((report, writer))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{cli::OutputFormat, kmer::KmerLength};

    fn index(k: usize) -> KmerIndex {
        KmerIndex::build(KmerLength::new(k).unwrap()).unwrap()
    }

    fn sink(index: &KmerIndex) -> SignatureSink<Vec<u8>> {
        SignatureSink::new(Vec::new(), OutputFormat::Tsv, index.columns()).unwrap()
    }

    #[test]
    fn zero_workers_rejected() {
        let idx = index(2);
        assert!(matches!(
            Pipeline::new(&idx, 0),
            Err(KmerSigError::InvalidWorkerCount { workers: 0 })
        ));
    }

    #[test]
    fn empty_input_fails_fast() {
        let idx = index(2);
        let result = Pipeline::new(&idx, 2)
            .unwrap()
            .run(Vec::<SequenceRecord>::new(), sink(&idx));
        assert!(matches!(result, Err(KmerSigError::EmptyInput)));
    }

    #[test]
    fn dispatch_sends_one_stop_per_worker() {
        let (tx, rx) = unbounded();
        let records = vec![SequenceRecord::new("a", "ACGT")];
        assert_eq!(dispatch(records.into_iter(), &tx, 3), 1);
        drop(tx);
        let items: Vec<WorkItem> = rx.iter().collect();
        assert_eq!(items.len(), 4);
        assert!(matches!(items[0], WorkItem::Sequence(_)));
        assert_eq!(
            items.iter().filter(|i| matches!(i, WorkItem::Stop)).count(),
            3
        );
    }

    #[test]
    fn writer_stops_on_sentinel() {
        let idx = index(1);
        let (tx, rx) = unbounded();
        tx.send(ResultItem::Signature {
            id: "a".into(),
            signature: Signature::from(vec![0.5, 0.5]),
        })
        .unwrap();
        tx.send(ResultItem::Stop).unwrap();
        // sent after the sentinel, must not be written
        tx.send(ResultItem::Signature {
            id: "b".into(),
            signature: Signature::from(vec![1.0, 0.0]),
        })
        .unwrap();

        let tracker = ProgressTracker::new(2);
        let (report, out) = write_results(rx, sink(&idx), &tracker, &|_: Progress| {}).unwrap();
        assert_eq!(report.rows_written, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Sequence Id\tA\tC\na\t0.5\t0.5\n"
        );
    }

    #[test]
    fn degenerate_sequences_are_reported_not_written() {
        let idx = index(4);
        let records = vec![
            SequenceRecord::new("ok", "ACGTACGTAC"),
            SequenceRecord::new("short", "AC"),
            SequenceRecord::new("masked", "NNNNNNNN"),
        ];
        let (report, out) = Pipeline::new(&idx, 2)
            .unwrap()
            .run(records, sink(&idx))
            .unwrap();
        assert_eq!(report.rows_written, 1);
        let mut degenerate = report.degenerate.clone();
        degenerate.sort();
        assert_eq!(degenerate, vec!["masked", "short"]);
        assert!(report.failures.is_empty());
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.lines().nth(1).unwrap().starts_with("ok\t"));
    }

    fn panic_on_x(bases: &[u8], index: &KmerIndex) -> Result<Signature, SignatureError> {
        if bases.contains(&b'X') {
            panic!("bad base");
        }
        extract(bases, index)
    }

    #[test]
    fn worker_panic_is_attributed_and_batch_continues() {
        let idx = index(2);
        let records = vec![
            SequenceRecord::new("good1", "ACGTTT"),
            SequenceRecord::new("bad", "ACXGT"),
            SequenceRecord::new("good2", "GGGCCC"),
        ];
        let (report, _) = Pipeline::new(&idx, 1)
            .unwrap()
            .extractor(panic_on_x)
            .run(records, sink(&idx))
            .unwrap();
        assert_eq!(report.rows_written, 2);
        assert_eq!(
            report.failures,
            vec![SequenceFailure {
                id: "bad".to_string(),
                error: SignatureError::WorkerFailure {
                    id: "bad".to_string(),
                    cause: "bad base".to_string(),
                },
            }]
        );
    }

    #[test]
    fn bounded_queues_complete() {
        let idx = index(3);
        let records: Vec<_> = (0..100)
            .map(|i| SequenceRecord::new(format!("seq{i}"), "GATTACAGATTACA"))
            .collect();
        let (report, _) = Pipeline::new(&idx, 4)
            .unwrap()
            .queue_capacity(1)
            .run(records, sink(&idx))
            .unwrap();
        assert_eq!(report.rows_written, 100);
    }

    #[test]
    fn panic_message_variants() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(s.as_ref()), "unknown panic");
    }
}
