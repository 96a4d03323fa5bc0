//! Werewolf CLI - Command-line interface for the werewolf engine
//!
//! Usage:
//!   werewolf init [dir]                   - Write a sample configuration
//!   werewolf validate --config <file>     - Check a configuration
//!   werewolf run --config <file> [--games N] [--seed S] [--export <dir>]

use clap::{Parser, Subcommand};
use cli::commands::{InitCommand, RunCommand, ValidateCommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "werewolf")]
#[command(about = "Werewolf - Social deduction game engine for autonomous agents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample 8-agent configuration
    Init(InitCommand),
    /// Check a configuration without playing
    Validate(ValidateCommand),
    /// Play simulated games with random agents
    Run(RunCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(cmd) => cmd.run(),
        Commands::Validate(cmd) => cmd.run(),
        Commands::Run(cmd) => cmd.run().await,
    }
}
