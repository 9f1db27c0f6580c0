//! Tests for progress reporting during signature computation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use kmersig::builder::SignatureCalculator;
use kmersig::progress::{Progress, ProgressTracker};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn progress_tracker_records_sequences() {
    let tracker = ProgressTracker::new(3);

    tracker.record_written();
    tracker.record_skipped();
    tracker.record_written();

    let progress = tracker.snapshot();
    assert_eq!(progress.sequences_finished, 3);
    assert_eq!(progress.rows_written, 2);
    assert!(progress.is_complete());
}

#[test]
fn calculate_with_progress_invokes_callback() {
    let output = NamedTempFile::new().unwrap();
    let callback_count = Arc::new(AtomicU64::new(0));
    let callback_count_clone = Arc::clone(&callback_count);

    let sigs = SignatureCalculator::new().k(3).unwrap().build().unwrap();
    let report = sigs
        .calculate_with_progress(fixture_path("simple.fa"), output.path(), move |_progress| {
            callback_count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .expect("should calculate signatures");

    // simple.fa has 3 sequences
    assert_eq!(callback_count.load(Ordering::SeqCst), 3);
    assert_eq!(report.rows_written, 3);
}

#[test]
fn calculate_with_progress_counts_skipped_sequences() {
    let output = NamedTempFile::new().unwrap();
    let max_finished = Arc::new(AtomicU64::new(0));
    let max_written = Arc::new(AtomicU64::new(0));
    let (finished, written) = (Arc::clone(&max_finished), Arc::clone(&max_written));

    let sigs = SignatureCalculator::new().k(4).unwrap().build().unwrap();
    sigs.calculate_with_progress(fixture_path("with_n.fa"), output.path(), move |progress: Progress| {
        assert_eq!(progress.total, 3);
        finished.fetch_max(progress.sequences_finished, Ordering::SeqCst);
        written.fetch_max(progress.rows_written, Ordering::SeqCst);
    })
    .expect("should calculate signatures");

    assert_eq!(max_finished.load(Ordering::SeqCst), 3);
    assert_eq!(max_written.load(Ordering::SeqCst), 1);
}
