//! Sequential driver for the fetch, transcribe, summarize chain.
//!
//! One record at a time: download the audio, turn it into a transcript,
//! condense the transcript, append the finished row to the report. A record
//! that cannot be fetched is reported and skipped; the rest of the batch
//! still runs.

pub mod progress;

pub use progress::{LogSink, ProgressSink};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::fetch::{FetchError, RecordingSource};
use crate::listing::CallRecord;
use crate::report::{CallSummaryRow, ReportWriter};
use crate::summarize::Summarizer;
use crate::transcribe::Transcriber;

/// Why a single record produced no report row.
///
/// Only the fetch stage can fail a record outright; transcription and
/// summarization degrade to sentinel text instead.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// A record that was dropped from the report, with the reason.
#[derive(Debug, Clone)]
pub struct RecordFailure {
    pub record_id: String,
    pub message: String,
}

/// Outcome of a pipeline run.
#[derive(Debug)]
pub struct RunReport {
    /// Rows written to the report, in input order.
    pub rows: Vec<CallSummaryRow>,
    /// Records dropped at the fetch boundary.
    pub failures: Vec<RecordFailure>,
    /// Number of records the run was asked to process.
    pub total: usize,
    /// True when the run stopped early on a cancellation request.
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Records handled so far, failed or not.
    pub fn processed(&self) -> usize {
        self.rows.len() + self.failures.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

pub struct Pipeline {
    source: Box<dyn RecordingSource>,
    transcriber: Transcriber,
    summarizer: Summarizer,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn RecordingSource>,
        transcriber: Transcriber,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            source,
            transcriber,
            summarizer,
        }
    }

    /// Process records in input order, appending one report row per
    /// completed record.
    ///
    /// Rows are written as soon as they are ready, so work done before a
    /// crash or cancellation stays on disk. Report write failures abort
    /// the run; everything record-scoped is contained.
    pub async fn run(
        &self,
        records: &[CallRecord],
        writer: &mut ReportWriter,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let total = records.len();
        info!("Processing {} recordings", total);

        let mut rows = Vec::new();
        let mut failures = Vec::new();
        let mut cancelled = false;

        for (index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    "Stopping on cancellation after {} of {} recordings",
                    index, total
                );
                cancelled = true;
                break;
            }

            match self.process_record(record).await {
                Ok(row) => {
                    writer.append_row(&row).with_context(|| {
                        format!("Could not write report row for recording {}", record.id)
                    })?;
                    rows.push(row);
                }
                Err(err) => {
                    let message = err.to_string();
                    warn!("Skipping recording {}: {}", record.id, message);
                    progress.record_failed(&record.id, &message);
                    failures.push(RecordFailure {
                        record_id: record.id.clone(),
                        message,
                    });
                }
            }

            progress.record_done(index + 1, total);
        }

        let report = RunReport {
            rows,
            failures,
            total,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Run finished: {} rows written, {} failures",
            report.rows.len(),
            report.failure_count()
        );
        Ok(report)
    }

    async fn process_record(&self, record: &CallRecord) -> Result<CallSummaryRow, RecordError> {
        let audio = self.source.fetch(record).await?;
        let transcript = self.transcriber.transcribe(&audio).await;
        let summary = self.summarizer.summarize(&transcript).await;

        Ok(CallSummaryRow {
            date_time: record.date_time.clone(),
            from_number: record.from_number.clone(),
            to_number: record.to_number.clone(),
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{read_report, ReportMode};
    use crate::summarize::{SummaryEngine, NO_TRANSCRIPT_SENTINEL};
    use crate::transcribe::SpeechEngine;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TestSource {
        fail_id: Option<String>,
        cancel_when: Option<(String, CancellationToken)>,
    }

    impl TestSource {
        fn ok() -> Self {
            Self {
                fail_id: None,
                cancel_when: None,
            }
        }

        fn failing(id: &str) -> Self {
            Self {
                fail_id: Some(id.to_string()),
                cancel_when: None,
            }
        }

        fn cancelling(id: &str, token: CancellationToken) -> Self {
            Self {
                fail_id: None,
                cancel_when: Some((id.to_string(), token)),
            }
        }
    }

    #[async_trait]
    impl RecordingSource for TestSource {
        async fn fetch(&self, record: &CallRecord) -> Result<PathBuf, FetchError> {
            if let Some((id, token)) = &self.cancel_when {
                if *id == record.id {
                    token.cancel();
                }
            }
            if self.fail_id.as_deref() == Some(record.id.as_str()) {
                return Err(FetchError::Status {
                    id: record.id.clone(),
                    status: StatusCode::NOT_FOUND,
                });
            }
            Ok(PathBuf::from(format!("/tmp/{}.mp3", record.id)))
        }
    }

    struct PathEchoSpeech;

    #[async_trait]
    impl SpeechEngine for PathEchoSpeech {
        fn name(&self) -> &'static str {
            "path-echo"
        }

        async fn transcribe(&self, audio: &Path) -> Result<String> {
            let stem = audio
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            Ok(format!("call {}", stem))
        }
    }

    struct FailingSpeech;

    #[async_trait]
    impl SpeechEngine for FailingSpeech {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn transcribe(&self, _audio: &Path) -> Result<String> {
            anyhow::bail!("engine offline")
        }
    }

    struct EchoSummary;

    #[async_trait]
    impl SummaryEngine for EchoSummary {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn summarize(&self, text: &str) -> Result<String> {
            Ok(format!("Summary: {}", text))
        }
    }

    #[derive(Default)]
    struct CountingSink {
        done: AtomicUsize,
        failed: Mutex<Vec<String>>,
    }

    impl ProgressSink for CountingSink {
        fn record_done(&self, _completed: usize, _total: usize) {
            self.done.fetch_add(1, Ordering::SeqCst);
        }

        fn record_failed(&self, record_id: &str, _message: &str) {
            self.failed.lock().unwrap().push(record_id.to_string());
        }
    }

    fn record(id: &str, minute: u32) -> CallRecord {
        CallRecord {
            id: id.to_string(),
            date_time: format!("15/01/2024, 10:{:02}", minute),
            from_number: "07911123456".to_string(),
            to_number: "01632960983".to_string(),
            owner_tag: "Vikki".to_string(),
        }
    }

    fn pipeline(source: TestSource) -> Pipeline {
        Pipeline::new(
            Box::new(source),
            Transcriber::new(Box::new(PathEchoSpeech)),
            Summarizer::new(Box::new(EchoSummary), 1000),
        )
    }

    #[tokio::test]
    async fn test_run_writes_one_row_per_record_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls_summary.csv");
        let mut writer = ReportWriter::create(&path, ReportMode::Append).unwrap();

        let records = vec![record("A1", 1), record("A2", 2), record("A3", 3)];
        let sink = CountingSink::default();
        let report = pipeline(TestSource::ok())
            .run(&records, &mut writer, &sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.processed(), 3);
        assert_eq!(report.failure_count(), 0);
        assert!(!report.cancelled);
        assert_eq!(report.rows[0].summary, "Summary: call A1");
        assert_eq!(report.rows[2].summary, "Summary: call A3");
        assert_eq!(sink.done.load(Ordering::SeqCst), 3);

        drop(writer);
        let rows = read_report(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date_time, "15/01/2024, 10:01");
        assert_eq!(rows[1].date_time, "15/01/2024, 10:02");
        assert_eq!(rows[2].date_time, "15/01/2024, 10:03");
    }

    #[tokio::test]
    async fn test_failing_fetch_skips_record_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls_summary.csv");
        let mut writer = ReportWriter::create(&path, ReportMode::Append).unwrap();

        let records = vec![record("A1", 1), record("A2", 2), record("A3", 3)];
        let sink = CountingSink::default();
        let report = pipeline(TestSource::failing("A2"))
            .run(&records, &mut writer, &sink, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures[0].record_id, "A2");
        assert!(report.failures[0].message.contains("404"));
        assert_eq!(sink.done.load(Ordering::SeqCst), 3);
        assert_eq!(*sink.failed.lock().unwrap(), vec!["A2".to_string()]);

        drop(writer);
        let rows = read_report(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].summary, "Summary: call A1");
        assert_eq!(rows[1].summary, "Summary: call A3");
    }

    #[tokio::test]
    async fn test_cancellation_stops_early_and_preserves_written_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls_summary.csv");
        let mut writer = ReportWriter::create(&path, ReportMode::Append).unwrap();

        let token = CancellationToken::new();
        let records = vec![record("A1", 1), record("A2", 2), record("A3", 3)];
        let sink = CountingSink::default();
        let report = pipeline(TestSource::cancelling("A2", token.clone()))
            .run(&records, &mut writer, &sink, &token)
            .await
            .unwrap();

        // The token fires while A2 is in flight, so A3 is never started.
        assert!(report.cancelled);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.processed(), 2);
        assert_eq!(report.total, 3);

        drop(writer);
        let rows = read_report(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].summary, "Summary: call A2");
    }

    #[tokio::test]
    async fn test_failed_transcription_degrades_to_sentinel_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls_summary.csv");
        let mut writer = ReportWriter::create(&path, ReportMode::Append).unwrap();

        let pipeline = Pipeline::new(
            Box::new(TestSource::ok()),
            Transcriber::new(Box::new(FailingSpeech)),
            Summarizer::new(Box::new(EchoSummary), 1000),
        );

        let records = vec![record("A1", 1)];
        let report = pipeline
            .run(
                &records,
                &mut writer,
                &LogSink,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.failure_count(), 0);
        assert_eq!(report.rows[0].summary, NO_TRANSCRIPT_SENTINEL);
    }
}
