//! CLI handler for full pipeline runs.
//!
//! Parses the listing, wires up the session, cache, engines and report,
//! then drives the pipeline with a progress bar and Ctrl-C handling.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::RunCliArgs;
use crate::config::Config;
use crate::fetch::{CallSession, RecordingCache, RecordingFetcher};
use crate::listing::parse_listing;
use crate::pipeline::{LogSink, Pipeline, ProgressSink, RunReport};
use crate::report::ReportWriter;
use crate::summarize::Summarizer;
use crate::transcribe::Transcriber;

const COOKIE_ENV_VAR: &str = "CALLSCRIBE_COOKIE";

/// Handle the run CLI command.
pub async fn handle_run_command(args: RunCliArgs) -> Result<()> {
    // 1. Parse the listing
    let html = std::fs::read_to_string(&args.listing)
        .with_context(|| format!("Could not read listing file {}", args.listing.display()))?;
    let records = parse_listing(&html);

    // 2. Resolve configuration and the report location
    let config = Config::load()?;
    let output = args.output.unwrap_or_else(|| config.report.path.clone());

    // 3. A zero-call run still leaves a valid report behind
    if records.is_empty() {
        ReportWriter::create(&output, args.mode)
            .with_context(|| format!("Could not open report {}", output.display()))?;
        println!("No calls detected in {}", args.listing.display());
        println!("Report: {}", output.display());
        return Ok(());
    }
    println!("Detected {} calls", records.len());

    // 4. Resolve the session cookie and build the fetch side
    let cookie_name = args
        .cookie_name
        .unwrap_or_else(|| config.fetch.cookie_name.clone());
    let cookie_value = resolve_cookie_value(args.cookie_value)?;
    let session = CallSession::new(&cookie_name, &cookie_value, &config.fetch.cookie_domain)?;
    let cache_dir = args
        .cache_dir
        .unwrap_or_else(|| config.fetch.cache_dir.clone());
    let cache = RecordingCache::new(cache_dir);
    debug!("Caching downloaded audio under {:?}", cache.dir());
    let fetcher = RecordingFetcher::new(session, config.fetch.base_url.clone(), cache);

    // 5. Build both engines up front; a misconfigured engine fails the run
    //    before any record is touched
    let transcriber = Transcriber::from_config(&config.transcriber)?;
    let summarizer = Summarizer::from_config(&config.summarizer)?;

    // 6. Open the report
    let mut writer = ReportWriter::create(&output, args.mode)
        .with_context(|| format!("Could not open report {}", output.display()))?;

    // 7. Wire Ctrl-C to cooperative cancellation
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupt received, finishing the current call...");
            ctrl_c_token.cancel();
        }
    });

    // 8. Run, with a progress bar unless asked not to
    let pipeline = Pipeline::new(Box::new(fetcher), transcriber, summarizer);
    let report = if args.no_progress {
        pipeline.run(&records, &mut writer, &LogSink, &cancel).await?
    } else {
        let sink = BarSink::new(records.len());
        let report = pipeline.run(&records, &mut writer, &sink, &cancel).await?;
        sink.finish();
        report
    };

    // 9. Final summary
    print_summary(&report, &output);

    Ok(())
}

/// Resolve the session cookie value from the flag or the environment.
fn resolve_cookie_value(flag: Option<String>) -> Result<String> {
    if let Some(value) = flag {
        return Ok(value);
    }

    match std::env::var(COOKIE_ENV_VAR) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => bail!(
            "No session cookie given. Pass --cookie-value or set {}",
            COOKIE_ENV_VAR
        ),
    }
}

/// Progress sink backed by a styled progress bar.
struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("━╸━"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_message("Processing...");
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_with_message("Complete");
    }
}

impl ProgressSink for BarSink {
    fn record_done(&self, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }

    fn record_failed(&self, record_id: &str, message: &str) {
        self.bar
            .println(format!("Recording {} failed: {}", record_id, message));
    }
}

/// Print the final run summary and the per-record failure list.
fn print_summary(report: &RunReport, output: &Path) {
    let duration = report.finished_at.signed_duration_since(report.started_at);

    println!();
    if report.cancelled {
        println!(
            "Cancelled after {} of {} calls: {} written, {} failed ({}s)",
            report.processed(),
            report.total,
            report.rows.len(),
            report.failure_count(),
            duration.num_seconds()
        );
    } else {
        println!(
            "Processed {} calls: {} written, {} failed ({}s)",
            report.total,
            report.rows.len(),
            report.failure_count(),
            duration.num_seconds()
        );
    }
    println!("Report: {}", output.display());

    if !report.failures.is_empty() {
        println!();
        println!("Failed recordings:");
        for failure in &report.failures {
            println!("  {}: {}", failure.record_id, failure.message);
        }
    }
}
