//! Progress reporting seam for pipeline runs.
//!
//! The pipeline reports through a `ProgressSink`; callers decide how to
//! present it (progress bar, plain log lines, nothing).

use tracing::info;

/// Receives per-record progress while a pipeline run is in flight.
pub trait ProgressSink: Send + Sync {
    /// Called after each record is handled, successfully or not.
    fn record_done(&self, completed: usize, total: usize);

    /// Called when a record is dropped from the report.
    fn record_failed(&self, record_id: &str, message: &str);
}

/// Progress sink that writes plain log lines.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn record_done(&self, completed: usize, total: usize) {
        info!("Processed {}/{} recordings", completed, total);
    }

    fn record_failed(&self, _record_id: &str, _message: &str) {
        // The pipeline already logs the failure itself.
    }
}
