//! Init Command - Initialize a new node

use std::fs;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::config::{default_config_path, default_data_dir, GridConfig};

/// Initialize a new node
#[derive(Args)]
pub struct InitCommand {
    /// Network name
    #[arg(short, long, default_value = "local")]
    network: String,

    /// Force overwrite existing configuration
    #[arg(short, long)]
    force: bool,
}

impl InitCommand {
    pub async fn execute(self, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
        let data_dir = data_dir.unwrap_or_else(|| default_data_dir(&self.network));
        let config_path = default_config_path(&data_dir);

        info!("Initializing CIPHERGRID node for {} network", self.network);
        info!("Data directory: {}", data_dir.display());

        // Check if already initialized
        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Node already initialized at {}. Use --force to overwrite.",
                data_dir.display()
            );
        }

        fs::create_dir_all(&data_dir)?;

        let config = GridConfig::for_network(&self.network);
        config.save(&config_path)?;

        info!("Configuration saved to {}", config_path.display());

        println!();
        println!("✅ CIPHERGRID node initialized successfully!");
        println!();
        println!("Configuration: {}", config_path.display());
        println!("Data directory: {}", data_dir.display());
        println!();
        println!("To start the node:");
        println!("  ciphergrid run --data-dir {}", data_dir.display());

        Ok(())
    }
}
