//! CIPHERGRID Node CLI
//!
//! Command-line interface for running CIPHERGRID aggregation nodes.
//!
//! # Usage
//!
//! ```bash
//! # Initialize a new node
//! ciphergrid init --network local
//!
//! # Start a local development node
//! ciphergrid run --network local
//!
//! # Start with a custom data directory
//! ciphergrid run --data-dir ~/.ciphergrid-local
//!
//! # Inspect the store of a stopped node
//! ciphergrid status
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod logging;

use commands::{InitCommand, RunCommand, StatusCommand};

/// CIPHERGRID Node
#[derive(Parser)]
#[command(name = "ciphergrid")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Confidential Spatial Aggregation Node", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(short, long, global = true, env = "CIPHERGRID_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new node
    Init(InitCommand),

    /// Run the node
    Run(RunCommand),

    /// Show node status
    Status(StatusCommand),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    logging::init(&cli.log_level, cli.json_logs)?;

    // Execute command
    match cli.command {
        Commands::Init(cmd) => cmd.execute(cli.data_dir).await,
        Commands::Run(cmd) => cmd.execute(cli.config, cli.data_dir).await,
        Commands::Status(cmd) => cmd.execute(cli.config, cli.data_dir).await,
        Commands::Version => {
            println!("ciphergrid {}", env!("CARGO_PKG_VERSION"));
            println!("Protocol: CIPHERGRID v1.0");
            println!("Network: Confidential Spatial Aggregation");
            Ok(())
        }
    }
}
