//! CLI handler for engine inspection.
//!
//! This module handles terminal presentation only; engine construction
//! lives in the `transcribe` and `summarize` modules.

use anyhow::{bail, Result};

use crate::cli::{EnginesCliArgs, EnginesCommand};
use crate::config::Config;
use crate::summarize::Summarizer;
use crate::transcribe::Transcriber;

pub fn handle_engines_command(args: EnginesCliArgs) -> Result<()> {
    match args.command {
        EnginesCommand::Show => handle_show(),
        EnginesCommand::Check => handle_check(),
    }
}

/// Show the configured engines without constructing them.
fn handle_show() -> Result<()> {
    let config = Config::load()?;

    println!();
    println!("Engine Configuration");
    println!("====================");
    println!();
    println!("Transcription:");
    println!("  Engine:     {}", config.transcriber.engine);
    println!("  Model:      {}", display_value(&config.transcriber.model));
    println!(
        "  Command:    {}",
        display_value(&config.transcriber.command_path)
    );
    println!(
        "  Endpoint:   {}",
        display_value(&config.transcriber.api_endpoint)
    );
    println!("  API Key:    {}", mask_secret(&config.transcriber.api_key));
    println!("  Translate:  {}", config.transcriber.translate);
    println!();
    println!("Summarization:");
    println!("  Engine:     {}", config.summarizer.engine);
    println!("  Model:      {}", display_value(&config.summarizer.model));
    println!(
        "  Endpoint:   {}",
        display_value(&config.summarizer.api_endpoint)
    );
    println!("  API Key:    {}", mask_secret(&config.summarizer.api_key));
    println!("  Command:    {}", display_value(&config.summarizer.command));
    println!("  Max input:  {} chars", config.summarizer.max_input_chars);
    println!();
    println!("Config file:  {}", crate::global::config_file()?.display());

    Ok(())
}

/// Construct both engines, surfacing configuration problems before a run.
fn handle_check() -> Result<()> {
    let config = Config::load()?;
    let mut failed = false;

    println!();
    print!("Transcription engine... ");
    match Transcriber::from_config(&config.transcriber) {
        Ok(transcriber) => println!("OK ({})", transcriber.engine_name()),
        Err(err) => {
            println!("FAILED: {:#}", err);
            failed = true;
        }
    }

    print!("Summarization engine... ");
    match Summarizer::from_config(&config.summarizer) {
        Ok(summarizer) => println!("OK ({})", summarizer.engine_name()),
        Err(err) => {
            println!("FAILED: {:#}", err);
            failed = true;
        }
    }

    if failed {
        bail!("Engine check failed");
    }

    Ok(())
}

// ============================================================================
// Display helpers
// ============================================================================

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    // Counted in characters, not bytes: a multi-byte secret must never be
    // sliced mid code point.
    match value {
        Some(secret) if secret.chars().count() > 8 => {
            let prefix: String = secret.chars().take(4).collect();
            let suffix: String = secret.chars().skip(secret.chars().count() - 2).collect();
            format!("{prefix}****{suffix}")
        }
        Some(secret) if !secret.is_empty() => "*".repeat(secret.chars().count()),
        _ => "<not set>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(&None), "<not set>");
        assert_eq!(mask_secret(&Some("".to_string())), "<not set>");
        assert_eq!(mask_secret(&Some("short".to_string())), "*****");
        assert_eq!(
            mask_secret(&Some("sk-1234567890abcdef".to_string())),
            "sk-1****ef"
        );
    }

    #[test]
    fn test_mask_secret_keeps_multibyte_secrets_intact() {
        // Three-byte characters put every byte-4 and len-2 boundary inside
        // a code point.
        assert_eq!(mask_secret(&Some("€€€€€€€€€".to_string())), "€€€€****€€");
        assert_eq!(mask_secret(&Some("épée".to_string())), "****");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&None), "<not set>");
        assert_eq!(
            display_value(&Some("whisper".to_string())),
            "whisper"
        );
    }
}
