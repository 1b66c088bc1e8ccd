use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::SummaryEngine;
use async_trait::async_trait;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You summarize phone call transcripts. \
    Reply with a two to three sentence summary of the call. \
    Output only the summary text.";

/// Keeps summaries short, in line with the report's single summary column.
const MAX_SUMMARY_TOKENS: u32 = 80;
const TEMPERATURE: f32 = 0.3;

// OpenAI-compatible chat completion request/response
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Summarization via an OpenAI-compatible chat completions endpoint.
pub struct ChatApiEngine {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatApiEngine {
    pub fn new(api_key: String, endpoint: Option<String>, model: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = endpoint.unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        info!(
            "Initialized chat API engine with base URL {} (model {})",
            base_url, model
        );

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SummaryEngine for ChatApiEngine {
    fn name(&self) -> &'static str {
        "Chat API"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        debug!("Requesting summary for {} chars of transcript", text.len());

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_SUMMARY_TOKENS,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to chat API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            error!(
                "Chat API request failed with status {}: {}",
                status, response_text
            );
            return Err(anyhow::anyhow!(
                "Chat API request failed with status {}: {}",
                status,
                response_text
            ));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat API response")?;

        let summary = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .context("Chat API returned no choices")?;

        info!("Summary complete: {} chars", summary.len());
        Ok(summary)
    }
}
