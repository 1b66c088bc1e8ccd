use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

pub mod whisper_api;
pub mod whisper_cli;

pub use whisper_api::WhisperApiEngine;
pub use whisper_cli::WhisperCliEngine;

/// Capability to turn an audio file into plain text.
///
/// Any component offering this single operation is substitutable: a local
/// binary, a remote API, or a test fake.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn transcribe(&self, audio: &Path) -> Result<String>;
}
