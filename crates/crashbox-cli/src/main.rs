//! crashbox CLI - Command-line interface for crashbox
//!
//! Provides commands for:
//! - Inspecting, sending and deleting stored crash records
//! - Checking collector reachability with a heartbeat
//! - Viewing and editing configuration
//! - Producing a test crash through the real panic hook

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use crashbox_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, ping::PingCommand,
    report::ReportCommand, trigger::TriggerCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "crashbox", version, about = "Crash capture and delivery for native applications")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage stored crash records
    #[command(subcommand)]
    Report(ReportCommand),
    /// Send a heartbeat to the collector
    Ping(PingCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Crash on purpose to test the pipeline
    Trigger(TriggerCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    // Setup tracing: RUST_LOG, then -v, then logging.level
    let level = match cli.verbose {
        0 => Config::load_or_default(&config_path).logging.level,
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = OutputFormat::from_json_flag(cli.json);

    match cli.command {
        Commands::Report(cmd) => cmd.execute(format, &config_path).await,
        Commands::Ping(cmd) => cmd.execute(format, &config_path).await,
        Commands::Config(cmd) => cmd.execute(format, &config_path).await,
        Commands::Trigger(cmd) => cmd.execute(format, &config_path).await,
        Commands::Completions(cmd) => cmd.execute(),
    }
}
