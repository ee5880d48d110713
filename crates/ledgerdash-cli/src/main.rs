//! Operator CLI for LedgerDash
//!
//! Validates deployment configuration and runs scripted dashboard sessions
//! against the in-memory ledger simulator.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{check_config, demo};

#[derive(Parser)]
#[command(name = "ledgerdash")]
#[command(about = "LedgerDash - asset and whitelist dashboard core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (TOML). Environment variables are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and print the resolved configuration
    CheckConfig,

    /// Run a scripted session against the in-memory simulator
    Demo {
        /// Print full snapshots as JSON after each step
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::CheckConfig => {
            check_config::run(cli.config.as_deref())?;
        }
        Commands::Demo { json } => {
            demo::run(cli.config.as_deref(), json).await?;
        }
    }

    Ok(())
}
