use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::listing::parse_listing;
use crate::report::ReportMode;

pub mod engines;
pub mod run;

pub use engines::handle_engines_command;
pub use run::handle_run_command;

#[derive(Parser, Debug)]
#[command(name = "callscribe")]
#[command(about = "Batch transcription and summaries for exported call recordings", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Download, transcribe and summarize every call in a listing
    Run(RunCliArgs),
    /// Parse a listing and print the detected calls
    Parse(ParseCliArgs),
    /// Inspect or check the configured engines
    Engines(EnginesCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct RunCliArgs {
    /// Exported call listing (HTML file)
    #[arg(short, long)]
    pub listing: PathBuf,
    /// Session cookie value; falls back to the CALLSCRIBE_COOKIE env var
    #[arg(long)]
    pub cookie_value: Option<String>,
    /// Session cookie name (default from config)
    #[arg(long)]
    pub cookie_name: Option<String>,
    /// Report destination (default from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Keep existing report rows or start the report over
    #[arg(long, value_enum, default_value_t = ReportMode::Append)]
    pub mode: ReportMode,
    /// Directory for downloaded audio (default from config)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ParseCliArgs {
    /// Exported call listing (HTML file)
    #[arg(short, long)]
    pub listing: PathBuf,
    /// Print records as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct EnginesCliArgs {
    #[command(subcommand)]
    pub command: EnginesCommand,
}

#[derive(Subcommand, Debug)]
pub enum EnginesCommand {
    /// Show the current engine configuration
    Show,
    /// Construct both engines and report configuration problems
    Check,
}

pub fn handle_parse_command(args: ParseCliArgs) -> Result<()> {
    let html = std::fs::read_to_string(&args.listing)
        .with_context(|| format!("Could not read listing file {}", args.listing.display()))?;
    let records = parse_listing(&html);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("Detected {} calls", records.len());
    for record in &records {
        println!(
            "{}  {} -> {}  [{}]  id={}",
            record.date_time, record.from_number, record.to_number, record.owner_tag, record.id
        );
    }

    Ok(())
}
