use anyhow::Result;
use async_trait::async_trait;

pub mod chat_api;
pub mod command;

pub use chat_api::ChatApiEngine;
pub use command::CommandEngine;

/// Capability to condense a transcript into a short summary.
#[async_trait]
pub trait SummaryEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn summarize(&self, text: &str) -> Result<String>;
}
