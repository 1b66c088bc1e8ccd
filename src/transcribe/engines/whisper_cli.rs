use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::SpeechEngine;

pub struct WhisperCliEngine {
    command_path: String,
    model: String,
    translate: bool,
}

impl WhisperCliEngine {
    pub fn new(command_path: Option<String>, model: String, translate: bool) -> Result<Self> {
        let command_path = command_path.unwrap_or_else(|| "whisper".to_string());
        crate::global::resolve_command(&command_path)
            .with_context(|| format!("Transcription command '{command_path}' is not available"))?;

        info!(
            "Initialized whisper CLI engine: {} (model {})",
            command_path, model
        );

        Ok(Self {
            command_path,
            model,
            translate,
        })
    }

    /// The whisper CLI writes one transcript file per input into
    /// --output_dir, named after the audio file's stem.
    fn transcript_file(&self, audio: &Path, out_dir: &Path) -> PathBuf {
        let mut name = audio
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| OsString::from("audio"));
        name.push(".txt");
        out_dir.join(name)
    }
}

#[async_trait]
impl SpeechEngine for WhisperCliEngine {
    fn name(&self) -> &'static str {
        "Whisper CLI"
    }

    async fn transcribe(&self, audio: &Path) -> Result<String> {
        info!(
            "Transcribing {:?} with '{}' (model {})",
            audio, self.command_path, self.model
        );

        let out_dir =
            tempfile::tempdir().context("Failed to create transcript output directory")?;

        let task = if self.translate {
            "translate"
        } else {
            "transcribe"
        };

        let output = tokio::process::Command::new(&self.command_path)
            .arg(audio)
            .arg("--model")
            .arg(&self.model)
            .arg("--task")
            .arg(task)
            .arg("--output_format")
            .arg("txt")
            .arg("--output_dir")
            .arg(out_dir.path())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run '{}'", self.command_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "'{}' exited with {}: {}",
                self.command_path,
                output.status,
                stderr.trim()
            );
        }

        let transcript_path = self.transcript_file(audio, out_dir.path());
        let text = tokio::fs::read_to_string(&transcript_path)
            .await
            .with_context(|| format!("No transcript was written at {:?}", transcript_path))?;

        debug!("Raw transcription: {}", text);
        Ok(text.trim().to_string())
    }
}
