//! Progress tracking for signature computation.
//!
//! The pipeline writer advances a [`ProgressTracker`] once per finished
//! sequence and hands a [`Progress`] snapshot to an optional callback.
//!
//! # Example
//!
//! ```rust,no_run
//! use kmersig::builder::SignatureCalculator;
//!
//! let signatures = SignatureCalculator::new().k(4)?.workers(4)?.build()?;
//! signatures.calculate_with_progress("genome.fa", "genome.tsv", |progress| {
//!     eprint!(
//!         "\r  Finished processing {} of {} ({:.2}%) sequences.",
//!         progress.sequences_finished,
//!         progress.total,
//!         progress.percent()
//!     );
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Progress snapshot during signature computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Sequences the writer has dealt with, whether written or reported.
    pub sequences_finished: u64,
    /// Rows written to the sink.
    pub rows_written: u64,
    /// Sequences in the batch.
    pub total: u64,
}

impl Progress {
    /// Percentage of the batch finished, 100 for an empty batch.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.sequences_finished as f64 * 100.0 / self.total as f64
        }
    }

    /// Returns true once every sequence has been finished.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.sequences_finished >= self.total
    }
}

/// Thread-safe progress tracker using atomic counters.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    finished: AtomicU64,
    written: AtomicU64,
    total: AtomicU64,
}

impl ProgressTracker {
    /// Create a tracker for a batch of `total` sequences.
    #[must_use]
    pub const fn new(total: u64) -> Self {
        Self {
            finished: AtomicU64::new(0),
            written: AtomicU64::new(0),
            total: AtomicU64::new(total),
        }
    }

    /// Record a sequence whose row was written.
    pub fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.finished.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sequence that produced no row.
    pub fn record_skipped(&self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of the current progress.
    pub fn snapshot(&self) -> Progress {
        Progress {
            sequences_finished: self.finished.load(Ordering::Relaxed),
            rows_written: self.written.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }
}
