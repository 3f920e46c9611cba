//! Progress reporting and summary statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use asset_sync_storage::{ProgressCallback, TransferProgress};

/// Units used by [`human_readable_file_size`], in increasing order.
const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Phase a sync is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    #[default]
    None,
    PreparingInProgress,
    DownloadInProgress,
    UploadInProgress,
}

/// A transient progress update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub status: ProgressStatus,
    /// Percent complete, 0.0 to 100.0.
    pub progress: f64,
    /// Bytes per second transferred so far.
    pub transfer_rate: f64,
    pub message: String,
}

/// Receives progress reports. Returning false cancels the sync.
pub trait ProgressReporter: Send + Sync {
    fn on_report(&self, report: &ProgressReport) -> bool;
}

impl<F> ProgressReporter for F
where
    F: Fn(&ProgressReport) -> bool + Send + Sync,
{
    fn on_report(&self, report: &ProgressReport) -> bool {
        self(report)
    }
}

/// Statistics of one completed sync.
///
/// `processed_* + skipped_* == total_*` always holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SummaryStatistics {
    pub total_time: Duration,
    pub total_files: u64,
    pub total_bytes: u64,
    pub processed_files: u64,
    pub processed_bytes: u64,
    pub skipped_files: u64,
    pub skipped_bytes: u64,
    /// Processed bytes per second; 0 when nothing was processed.
    pub transfer_rate: f64,
}

/// Format a byte count with two decimal places of precision.
///
/// Rounds to two decimals first and only moves to the next unit when the
/// rounded value reaches 1000, so `999995` formats as `1.0 MB`.
pub fn human_readable_file_size(size_in_bytes: u64) -> String {
    let mut size: f64 = size_in_bytes as f64;
    for (index, unit) in SIZE_UNITS.iter().enumerate() {
        let rounded: f64 = (size * 100.0).round() / 100.0;
        if rounded < 1000.0 || index == SIZE_UNITS.len() - 1 {
            return format!("{:?} {}", rounded, unit);
        }
        size /= 1000.0;
    }
    format!("{:?} B", size_in_bytes as f64)
}

/// Shared, lock-free accounting for one sync.
#[derive(Debug)]
pub struct ProgressTracker {
    status: ProgressStatus,
    verb: &'static str,
    expected_files: AtomicU64,
    expected_bytes: AtomicU64,
    processed_files: AtomicU64,
    processed_bytes: AtomicU64,
    skipped_files: AtomicU64,
    skipped_bytes: AtomicU64,
    in_flight_bytes: AtomicU64,
    started: Instant,
}

impl ProgressTracker {
    /// Tracker for a download phase.
    pub fn for_download() -> Self {
        Self::new(ProgressStatus::DownloadInProgress, "Downloaded")
    }

    /// Tracker for an upload phase.
    pub fn for_upload() -> Self {
        Self::new(ProgressStatus::UploadInProgress, "Uploaded")
    }

    fn new(status: ProgressStatus, verb: &'static str) -> Self {
        Self {
            status,
            verb,
            expected_files: AtomicU64::new(0),
            expected_bytes: AtomicU64::new(0),
            processed_files: AtomicU64::new(0),
            processed_bytes: AtomicU64::new(0),
            skipped_files: AtomicU64::new(0),
            skipped_bytes: AtomicU64::new(0),
            in_flight_bytes: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Add files to the expected totals used for percent complete.
    pub fn add_expected(&self, files: u64, bytes: u64) {
        self.expected_files.fetch_add(files, Ordering::Relaxed);
        self.expected_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Count a file that was transferred.
    ///
    /// # Arguments
    /// * `size` - File size
    /// * `streamed` - Bytes already counted through [`FileProgress`] for this file
    pub fn record_processed(&self, size: u64, streamed: u64) {
        self.in_flight_bytes.fetch_sub(streamed, Ordering::Relaxed);
        self.processed_files.fetch_add(1, Ordering::Relaxed);
        self.processed_bytes.fetch_add(size, Ordering::Relaxed);
    }

    /// Count a file that did not need transferring.
    pub fn record_skipped(&self, size: u64) {
        self.skipped_files.fetch_add(1, Ordering::Relaxed);
        self.skipped_bytes.fetch_add(size, Ordering::Relaxed);
    }

    fn add_in_flight(&self, bytes: u64) {
        self.in_flight_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn done_bytes(&self) -> u64 {
        self.processed_bytes.load(Ordering::Relaxed)
            + self.skipped_bytes.load(Ordering::Relaxed)
            + self.in_flight_bytes.load(Ordering::Relaxed)
    }

    fn transfer_rate(&self) -> f64 {
        let seconds: f64 = self.started.elapsed().as_secs_f64();
        let transferred: u64 = self.processed_bytes.load(Ordering::Relaxed)
            + self.in_flight_bytes.load(Ordering::Relaxed);
        if transferred == 0 || seconds <= 0.0 {
            0.0
        } else {
            transferred as f64 / seconds
        }
    }

    /// Build the current progress report.
    pub fn current_report(&self) -> ProgressReport {
        let expected_bytes: u64 = self.expected_bytes.load(Ordering::Relaxed);
        let done_bytes: u64 = self.done_bytes();
        let progress: f64 = if expected_bytes == 0 {
            0.0
        } else {
            ((done_bytes as f64 / expected_bytes as f64) * 100.0).min(100.0)
        };
        self.report_at(progress, done_bytes, expected_bytes)
    }

    /// Build the report emitted once every file is accounted for.
    pub fn final_report(&self) -> ProgressReport {
        let done_bytes: u64 = self.done_bytes();
        let expected_bytes: u64 = self.expected_bytes.load(Ordering::Relaxed).max(done_bytes);
        self.report_at(100.0, done_bytes, expected_bytes)
    }

    fn report_at(&self, progress: f64, done_bytes: u64, expected_bytes: u64) -> ProgressReport {
        let transfer_rate: f64 = self.transfer_rate();
        ProgressReport {
            status: self.status,
            progress,
            transfer_rate,
            message: format!(
                "{} {} / {} of {} files (Transfer rate: {}/s)",
                self.verb,
                human_readable_file_size(done_bytes),
                human_readable_file_size(expected_bytes),
                self.expected_files.load(Ordering::Relaxed),
                human_readable_file_size(transfer_rate as u64),
            ),
        }
    }

    /// Send the current report; false means the reporter asked to cancel.
    pub fn report(&self, reporter: Option<&dyn ProgressReporter>) -> bool {
        match reporter {
            Some(r) => r.on_report(&self.current_report()),
            None => true,
        }
    }

    /// Statistics so far.
    pub fn summary(&self) -> SummaryStatistics {
        let processed_files: u64 = self.processed_files.load(Ordering::Relaxed);
        let processed_bytes: u64 = self.processed_bytes.load(Ordering::Relaxed);
        let skipped_files: u64 = self.skipped_files.load(Ordering::Relaxed);
        let skipped_bytes: u64 = self.skipped_bytes.load(Ordering::Relaxed);
        let total_time: Duration = self.started.elapsed();
        let seconds: f64 = total_time.as_secs_f64();
        let transfer_rate: f64 = if processed_bytes == 0 || seconds <= 0.0 {
            0.0
        } else {
            processed_bytes as f64 / seconds
        };

        SummaryStatistics {
            total_time,
            total_files: processed_files + skipped_files,
            total_bytes: processed_bytes + skipped_bytes,
            processed_files,
            processed_bytes,
            skipped_files,
            skipped_bytes,
            transfer_rate,
        }
    }
}

/// Per-file transfer callback feeding a [`ProgressTracker`].
///
/// Forwards an aggregate report to the sync's reporter on each chunk and
/// cancels the transfer when the reporter returns false.
pub struct FileProgress<'a> {
    tracker: &'a ProgressTracker,
    reporter: Option<&'a dyn ProgressReporter>,
    streamed: AtomicU64,
}

impl<'a> FileProgress<'a> {
    pub fn new(tracker: &'a ProgressTracker, reporter: Option<&'a dyn ProgressReporter>) -> Self {
        Self {
            tracker,
            reporter,
            streamed: AtomicU64::new(0),
        }
    }

    /// Bytes of this file counted so far.
    pub fn streamed(&self) -> u64 {
        self.streamed.load(Ordering::Relaxed)
    }
}

impl ProgressCallback for FileProgress<'_> {
    fn on_progress(&self, progress: &TransferProgress) -> bool {
        let previous: u64 = self
            .streamed
            .fetch_max(progress.bytes_transferred, Ordering::Relaxed);
        if progress.bytes_transferred > previous {
            self.tracker.add_in_flight(progress.bytes_transferred - previous);
        }
        self.tracker.report(self.reporter)
    }
}
