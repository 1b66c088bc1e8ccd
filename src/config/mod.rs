use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub transcriber: TranscriberConfig,
    pub summarizer: SummarizerConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Base URL of the recordings endpoint.
    pub base_url: String,
    /// Name of the session cookie sent with every download request.
    pub cookie_name: String,
    /// Domain the session cookie is scoped to.
    pub cookie_domain: String,
    /// Directory downloaded recordings are cached in.
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Speech engine: "whisper-cli" or "whisper-api".
    pub engine: String,
    pub model: Option<String>,
    /// Path to the whisper binary for the CLI engine.
    pub command_path: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Translate speech to English instead of transcribing verbatim.
    pub translate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Summary engine: "chat-api" or "command".
    pub engine: String,
    pub model: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Shell command for the command engine. Receives the transcript on stdin.
    pub command: Option<String>,
    /// Transcripts longer than this are cut before summarization.
    pub max_input_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Destination CSV file.
    pub path: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://controlpanel.voipfone.co.uk/api/srv".to_string(),
            cookie_name: "voipfone_auth".to_string(),
            cookie_domain: ".voipfone.co.uk".to_string(),
            cache_dir: PathBuf::from("temp_recordings"),
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            engine: "whisper-cli".to_string(),
            model: Some("tiny".to_string()),
            command_path: None,
            api_endpoint: None,
            api_key: None,
            translate: true,
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            engine: "chat-api".to_string(),
            model: None,
            api_endpoint: None,
            api_key: None,
            command: None,
            max_input_chars: 1000,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("calls_summary.csv"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
