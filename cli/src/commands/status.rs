//! Status Command - Show node status

use std::path::PathBuf;

use clap::Args;

use ciphergrid_storage::Storage;

use crate::config::{default_config_path, default_data_dir, GridConfig};

/// Show node status
#[derive(Args)]
pub struct StatusCommand {
    /// Network name (used to locate the data directory)
    #[arg(short, long, default_value = "local")]
    network: String,
}

impl StatusCommand {
    pub async fn execute(
        self,
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> anyhow::Result<()> {
        let data_dir = data_dir.unwrap_or_else(|| default_data_dir(&self.network));

        // Config is optional here; it only refines the network name and db file
        let config = if let Some(path) = &config_path {
            GridConfig::load(path)?
        } else {
            let default_path = default_config_path(&data_dir);
            if default_path.exists() {
                GridConfig::load(&default_path)?
            } else {
                GridConfig::for_network(&self.network)
            }
        };

        let db_path = data_dir.join(&config.storage.file);

        println!("Inspecting store at {}...", db_path.display());
        println!();

        if !db_path.exists() {
            println!("❌ No store found");
            println!();
            println!("Initialize and start the node first:");
            println!("  ciphergrid init --network {}", config.node.network);
            println!("  ciphergrid run --data-dir {}", data_dir.display());
            return Ok(());
        }

        match Storage::open(&db_path) {
            Ok(storage) => {
                let stats = storage.stats();
                let meta = storage.grid.meta()?.unwrap_or_default();
                let map_ready = meta.resolution > 0;

                println!("✅ Store opened");
                println!();
                println!("Network:          {}", config.node.network);
                println!("Observations:     {}", stats.observation_count);
                println!("Providers:        {}", stats.provider_count);
                println!("Pending requests: {}", stats.pending_requests);
                println!("Grid resolution:  {}", meta.resolution);
                println!("Grid cells:       {}", stats.grid_cells);
                println!("Map ready:        {}", if map_ready { "yes" } else { "no" });
                println!("Revealed:         {}", if meta.revealed { "yes" } else { "no" });
            }
            Err(e) => {
                println!("❌ Could not open store");
                println!();
                println!("Error: {}", e);
                println!();
                println!("The store is locked while a node holds it. Stop the node");
                println!("first, or query the running node over RPC instead.");
            }
        }

        Ok(())
    }
}
