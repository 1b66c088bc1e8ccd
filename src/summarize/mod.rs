use anyhow::{bail, Context, Result};
use tracing::{error, info};

use crate::config::SummarizerConfig;

pub mod engines;

pub use engines::{ChatApiEngine, CommandEngine, SummaryEngine};

/// Summary recorded for a call with no usable transcript.
pub const NO_TRANSCRIPT_SENTINEL: &str = "No transcript available";

/// Summary recorded when the summary engine fails on a call.
pub const SUMMARY_ERROR_SENTINEL: &str = "Error in summarization";

const COMMAND_TIMEOUT_SECONDS: u64 = 120;

/// Build the configured summary engine. Fails fast on unknown engine names or
/// unusable engine configuration.
pub fn build_summary_engine(config: &SummarizerConfig) -> Result<Box<dyn SummaryEngine>> {
    let engine: Box<dyn SummaryEngine> = match config.engine.as_str() {
        "chat-api" => {
            let api_key = config
                .api_key
                .clone()
                .context("api_key is required for the chat-api engine")?;
            Box::new(ChatApiEngine::new(
                api_key,
                config.api_endpoint.clone(),
                config.model.clone(),
            )?)
        }
        "command" => {
            let command = config
                .command
                .clone()
                .context("command is required for the command engine")?;
            Box::new(CommandEngine::new(command, COMMAND_TIMEOUT_SECONDS)?)
        }
        other => bail!(
            "Unknown summary engine '{}'. Supported engines: chat-api, command",
            other
        ),
    };

    info!("Using {} for summarization", engine.name());

    Ok(engine)
}

/// Guard wrapper around a summary engine.
///
/// Empty transcripts never reach the engine. Oversized transcripts are cut
/// to `max_input_chars` first, and an engine failure becomes a sentinel
/// summary instead of a run failure.
pub struct Summarizer {
    engine: Box<dyn SummaryEngine>,
    max_input_chars: usize,
}

impl Summarizer {
    pub fn new(engine: Box<dyn SummaryEngine>, max_input_chars: usize) -> Self {
        Self {
            engine,
            max_input_chars,
        }
    }

    pub fn from_config(config: &SummarizerConfig) -> Result<Self> {
        Ok(Self::new(
            build_summary_engine(config)?,
            config.max_input_chars,
        ))
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub async fn summarize(&self, text: &str) -> String {
        if text.is_empty() {
            return NO_TRANSCRIPT_SENTINEL.to_string();
        }

        let input = truncate_chars(text, self.max_input_chars);

        match self.engine.summarize(input).await {
            Ok(summary) => summary.trim().to_string(),
            Err(err) => {
                error!("Summarization error: {:#}", err);
                SUMMARY_ERROR_SENTINEL.to_string()
            }
        }
    }
}

/// Cut `text` to at most `max_chars` characters, on a character boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
