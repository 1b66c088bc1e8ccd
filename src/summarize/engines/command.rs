use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use super::SummaryEngine;

/// Summarization via a user-supplied shell command.
///
/// - Pipes the transcript to stdin
/// - Reads the summary from stdout
/// - Kills the process on timeout
pub struct CommandEngine {
    command: String,
    timeout: Duration,
}

impl CommandEngine {
    pub fn new(command: String, timeout_seconds: u64) -> Result<Self> {
        // A lone word names a program and must resolve up front. Longer
        // lines are shell syntax (arguments, pipes, builtins) and only the
        // shell can tell what they run.
        let trimmed = command.trim();
        if !trimmed.is_empty() && !trimmed.contains(char::is_whitespace) {
            crate::global::resolve_command(trimmed)
                .with_context(|| format!("Summary command '{trimmed}' is not available"))?;
        }

        Ok(Self {
            command,
            timeout: Duration::from_secs(timeout_seconds),
        })
    }
}

#[async_trait]
impl SummaryEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "Command"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        debug!("Running summary command: {}", self.command);

        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn summary command '{}'", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            use tokio::io::AsyncWriteExt;
            stdin
                .write_all(text.as_bytes())
                .await
                .context("Failed to write transcript to summary command")?;
            // Drop stdin to signal EOF
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.context("Summary command failed to run")?,
            Err(_) => bail!(
                "Summary command timed out after {}s",
                self.timeout.as_secs()
            ),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Summary command exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        let summary = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("Summary command produced {} chars", summary.len());
        Ok(summary)
    }
}
