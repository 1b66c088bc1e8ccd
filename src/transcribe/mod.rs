use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{error, info};

use crate::config::TranscriberConfig;

pub mod engines;

pub use engines::{SpeechEngine, WhisperApiEngine, WhisperCliEngine};

/// Build the configured speech engine.
///
/// An unknown engine name, missing engine configuration or an absent
/// transcription command fails here, before any record is processed.
pub fn build_speech_engine(config: &TranscriberConfig) -> Result<Box<dyn SpeechEngine>> {
    let engine: Box<dyn SpeechEngine> = match config.engine.as_str() {
        "whisper-cli" => {
            let model = config.model.clone().unwrap_or_else(|| "tiny".to_string());
            Box::new(WhisperCliEngine::new(
                config.command_path.clone(),
                model,
                config.translate,
            )?)
        }
        "whisper-api" => {
            let api_key = config
                .api_key
                .clone()
                .context("api_key is required for the whisper-api engine")?;
            let model = config
                .model
                .clone()
                .unwrap_or_else(|| "whisper-1".to_string());
            Box::new(WhisperApiEngine::new(
                api_key,
                config.api_endpoint.clone(),
                model,
                config.translate,
            )?)
        }
        other => bail!(
            "Unknown speech engine '{}'. Supported engines: whisper-cli, whisper-api",
            other
        ),
    };

    info!("Using {} for transcription", engine.name());

    Ok(engine)
}

/// Degrade-not-abort wrapper around a speech engine.
///
/// An engine failure on one recording is reported and becomes an empty
/// transcript; it never stops the batch.
pub struct Transcriber {
    engine: Box<dyn SpeechEngine>,
}

impl Transcriber {
    pub fn new(engine: Box<dyn SpeechEngine>) -> Self {
        Self { engine }
    }

    pub fn from_config(config: &TranscriberConfig) -> Result<Self> {
        Ok(Self::new(build_speech_engine(config)?))
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub async fn transcribe(&self, audio: &Path) -> String {
        match self.engine.transcribe(audio).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                error!("Transcription error on {:?}: {:#}", audio, err);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedEngine(&'static str);

    #[async_trait]
    impl SpeechEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn transcribe(&self, _audio: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl SpeechEngine for FailingEngine {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn transcribe(&self, _audio: &Path) -> Result<String> {
            bail!("engine exploded")
        }
    }

    #[tokio::test]
    async fn test_transcriber_trims_engine_output() {
        let transcriber = Transcriber::new(Box::new(FixedEngine("  hello world \n")));
        let text = transcriber.transcribe(Path::new("a.mp3")).await;
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn test_engine_failure_degrades_to_empty_transcript() {
        let transcriber = Transcriber::new(Box::new(FailingEngine));
        let text = transcriber.transcribe(Path::new("a.mp3")).await;
        assert_eq!(text, "");
    }

    #[test]
    fn test_cli_engine_builds_when_command_resolves() {
        let config = TranscriberConfig {
            command_path: Some("/bin/sh".to_string()),
            ..Default::default()
        };

        let transcriber = Transcriber::from_config(&config).unwrap();
        assert_eq!(transcriber.engine_name(), "Whisper CLI");
    }

    #[test]
    fn test_missing_transcription_command_fails_the_build() {
        let config = TranscriberConfig {
            command_path: Some("/nonexistent/whisper-binary".to_string()),
            ..Default::default()
        };

        let err = build_speech_engine(&config).err().unwrap();
        assert!(format!("{err:#}").contains("/nonexistent/whisper-binary"));
    }

    #[test]
    fn test_whisper_api_requires_api_key() {
        let config = TranscriberConfig {
            engine: "whisper-api".to_string(),
            api_key: None,
            ..Default::default()
        };

        let err = build_speech_engine(&config).err().unwrap();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_unknown_engine_name_is_rejected() {
        let config = TranscriberConfig {
            engine: "telepathy".to_string(),
            ..Default::default()
        };

        let err = build_speech_engine(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown speech engine"));
    }
}
