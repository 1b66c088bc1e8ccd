use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info};

use super::SpeechEngine;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    r#type: Option<String>,
    code: Option<String>,
}

/// OpenAI-compatible audio transcription API engine.
pub struct WhisperApiEngine {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    translate: bool,
}

impl WhisperApiEngine {
    pub fn new(
        api_key: String,
        endpoint: Option<String>,
        model: String,
        translate: bool,
    ) -> Result<Self> {
        let client = reqwest::Client::new();
        let base_url = endpoint.unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        info!("Initialized whisper API engine with base URL: {}", base_url);

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
            translate,
        })
    }

    fn endpoint(&self) -> String {
        let operation = if self.translate {
            "translations"
        } else {
            "transcriptions"
        };
        format!("{}/audio/{}", self.base_url.trim_end_matches('/'), operation)
    }
}

fn mime_for(audio: &Path) -> &'static str {
    match audio.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        _ => "audio/mpeg",
    }
}

#[async_trait]
impl SpeechEngine for WhisperApiEngine {
    fn name(&self) -> &'static str {
        "Whisper API"
    }

    async fn transcribe(&self, audio: &Path) -> Result<String> {
        info!("Transcribing audio file via whisper API: {:?}", audio);

        let audio_data = fs::read(audio).await.context("Failed to read audio file")?;
        let filename = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let form = Form::new()
            .part(
                "file",
                Part::bytes(audio_data)
                    .file_name(filename)
                    .mime_str(mime_for(audio))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to send request to whisper API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            error!(
                "Whisper API request failed with status {}: {}",
                status, response_text
            );

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&response_text) {
                return Err(anyhow::anyhow!(
                    "Whisper API error: {} (type: {:?}, code: {:?})",
                    error_response.error.message,
                    error_response.error.r#type,
                    error_response.error.code
                ));
            }

            return Err(anyhow::anyhow!(
                "Whisper API request failed with status {}: {}",
                status,
                response_text
            ));
        }

        let transcription: TranscriptionResponse = serde_json::from_str(&response_text)
            .context("Failed to parse transcription response")?;

        let text = transcription.text.trim().to_string();
        info!("Transcription complete: {} chars", text.len());
        debug!("Raw transcription: {}", text);

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_selects_translation_operation() {
        let translating =
            WhisperApiEngine::new("sk-test".to_string(), None, "whisper-1".to_string(), true)
                .unwrap();
        assert_eq!(
            translating.endpoint(),
            "https://api.openai.com/v1/audio/translations"
        );

        let verbatim =
            WhisperApiEngine::new("sk-test".to_string(), None, "whisper-1".to_string(), false)
                .unwrap();
        assert_eq!(
            verbatim.endpoint(),
            "https://api.openai.com/v1/audio/transcriptions"
        );
    }

    #[test]
    fn test_endpoint_accepts_custom_base_with_trailing_slash() {
        let engine = WhisperApiEngine::new(
            "sk-test".to_string(),
            Some("http://localhost:8080/v1/".to_string()),
            "whisper-1".to_string(),
            true,
        )
        .unwrap();

        assert_eq!(engine.endpoint(), "http://localhost:8080/v1/audio/translations");
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for(Path::new("a.mp3")), "audio/mpeg");
        assert_eq!(mime_for(Path::new("a.wav")), "audio/wav");
        assert_eq!(mime_for(Path::new("a")), "audio/mpeg");
    }

    #[test]
    fn test_parse_transcription_response() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"text": " Hello there. "}"#).unwrap();
        assert_eq!(parsed.text, " Hello there. ");
    }

    #[test]
    fn test_parse_error_response() {
        let parsed: ErrorResponse = serde_json::from_str(
            r#"{"error": {"message": "Invalid file format.", "type": "invalid_request_error", "code": null}}"#,
        )
        .unwrap();
        assert_eq!(parsed.error.message, "Invalid file format.");
        assert_eq!(parsed.error.r#type.as_deref(), Some("invalid_request_error"));
        assert!(parsed.error.code.is_none());
    }
}
