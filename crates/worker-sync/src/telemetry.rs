//! Summary sinks notified at the end of each sync.

use tracing::info;

use crate::progress::{human_readable_file_size, SummaryStatistics};

/// Which sync produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    Inputs,
    Outputs,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::Inputs => "inputs",
            SyncDirection::Outputs => "outputs",
        }
    }
}

/// Receives the statistics of every completed sync.
pub trait SummarySink: Send + Sync {
    fn record(&self, direction: SyncDirection, statistics: &SummaryStatistics);
}

/// Logs summaries through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSummarySink;

impl SummarySink for TracingSummarySink {
    fn record(&self, direction: SyncDirection, statistics: &SummaryStatistics) {
        info!(
            direction = direction.as_str(),
            total_files = statistics.total_files,
            total_bytes = statistics.total_bytes,
            processed_files = statistics.processed_files,
            skipped_files = statistics.skipped_files,
            "Synced {} files ({}) in {:.2}s, {} transferred at {}/s",
            statistics.total_files,
            human_readable_file_size(statistics.total_bytes),
            statistics.total_time.as_secs_f64(),
            human_readable_file_size(statistics.processed_bytes),
            human_readable_file_size(statistics.transfer_rate as u64),
        );
    }
}
