use clap::ValueEnum;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::Path;
use thiserror::Error;

/// Column headers of the summary report, in order.
const HEADERS: [&str; 4] = ["Date (+time)", "From", "To", "Summary"];

/// One finished row of the summary report.
///
/// A row exists only for records that completed the fetch, transcription and
/// summarization chain; a degraded stage shows up as sentinel summary text,
/// never as a missing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSummaryRow {
    #[serde(rename = "Date (+time)")]
    pub date_time: String,
    #[serde(rename = "From")]
    pub from_number: String,
    #[serde(rename = "To")]
    pub to_number: String,
    #[serde(rename = "Summary")]
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Keep existing rows, add new ones after them.
    Append,
    /// Start the report over.
    Overwrite,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report serialization error: {0}")]
    Csv(#[from] csv::Error),
}

/// Incremental CSV writer for the summary report.
///
/// The header is written exactly once per destination file, before any data
/// row; every appended row is flushed so completed work survives a crash
/// later in the run.
pub struct ReportWriter {
    writer: csv::Writer<File>,
}

impl ReportWriter {
    pub fn create(path: &Path, mode: ReportMode) -> Result<Self, ReportError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let (file, needs_header) = match mode {
            ReportMode::Overwrite => (File::create(path)?, true),
            ReportMode::Append => {
                let needs_header = match std::fs::metadata(path) {
                    Ok(meta) => meta.len() == 0,
                    Err(_) => true,
                };
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                (file, needs_header)
            }
        };

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer.write_record(HEADERS)?;
            writer.flush()?;
        }

        Ok(Self { writer })
    }

    pub fn append_row(&mut self, row: &CallSummaryRow) -> Result<(), ReportError> {
        self.writer.serialize(row)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Read a summary report back into rows.
pub fn read_report(path: &Path) -> Result<Vec<CallSummaryRow>, ReportError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }

    Ok(rows)
}
