use anyhow::Result;
use callscribe::cli::{
    handle_engines_command, handle_parse_command, handle_run_command, Cli, CliCommand,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        CliCommand::Run(args) => handle_run_command(args).await,
        CliCommand::Parse(args) => handle_parse_command(args),
        CliCommand::Engines(args) => handle_engines_command(args),
        CliCommand::Version => {
            println!("callscribe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
