//! Run Command - Run the CIPHERGRID node

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::signal;
use tracing::info;

use ciphergrid_node::{GridNode, NodeConfig};
use ciphergrid_oracle::OracleConfig;
use ciphergrid_rpc::{GridContext, RpcConfig, RpcServer};

use crate::config::{default_config_path, default_data_dir, GridConfig};

/// Run the CIPHERGRID node
#[derive(Args)]
pub struct RunCommand {
    /// Network name
    #[arg(short, long)]
    network: Option<String>,

    /// Disable RPC server
    #[arg(long)]
    no_rpc: bool,

    /// RPC HTTP bind address
    #[arg(long)]
    rpc_addr: Option<String>,

    /// Oracle committee size
    #[arg(long)]
    committee_size: Option<usize>,

    /// Oracle signature threshold
    #[arg(long)]
    threshold: Option<usize>,
}

impl RunCommand {
    pub async fn execute(
        self,
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> anyhow::Result<()> {
        // Load or create configuration
        let network = self.network.as_deref().unwrap_or("local");
        let data_dir = data_dir.unwrap_or_else(|| default_data_dir(network));

        let mut config = if let Some(path) = &config_path {
            GridConfig::load(path)?
        } else {
            let default_path = default_config_path(&data_dir);
            if default_path.exists() {
                GridConfig::load(&default_path)?
            } else {
                GridConfig::for_network(network)
            }
        };

        // Apply command-line overrides
        if let Some(network) = &self.network {
            config.node.network = network.clone();
        }
        if self.no_rpc {
            config.rpc.enabled = false;
        }
        if let Some(rpc_addr) = &self.rpc_addr {
            config.rpc.http_addr = rpc_addr.clone();
        }
        if let Some(committee_size) = self.committee_size {
            config.oracle.committee_size = committee_size;
        }
        if let Some(threshold) = self.threshold {
            config.oracle.threshold = threshold;
        }

        info!("Starting CIPHERGRID node");
        info!("Network: {}", config.node.network);
        info!("Data directory: {}", data_dir.display());

        let node_config = NodeConfig {
            data_dir: data_dir.clone(),
            network: config.node.network.clone(),
            oracle: OracleConfig {
                committee_size: config.oracle.committee_size,
                threshold: config.oracle.threshold,
            },
            poll_interval: Duration::from_millis(config.node.poll_interval_ms),
            event_buffer: config.node.event_buffer,
        };

        let node = Arc::new(GridNode::new(node_config).await?);
        node.start().await?;

        // Start RPC server if enabled
        let mut rpc_server = if config.rpc.enabled {
            let rpc_config = RpcConfig {
                http_addr: config.rpc.http_addr.parse()?,
                cors_enabled: config.rpc.cors_enabled,
                cors_origins: config.rpc.cors_origins.clone(),
                require_admin_auth: config.rpc.require_admin_auth,
                admin_token: config.rpc.admin_token.clone(),
                ..RpcConfig::default()
            };

            let context = GridContext { node: node.clone() };
            let mut server = RpcServer::new(rpc_config, context);
            server.start().await?;
            info!("RPC server started on {}", config.rpc.http_addr);
            Some(server)
        } else {
            None
        };

        // Run the oracle pump until shutdown
        let pump = tokio::spawn({
            let node = node.clone();
            async move { node.run().await }
        });

        println!();
        println!("🚀 CIPHERGRID node is running!");
        println!();
        println!("Network: {}", config.node.network);
        println!("Data directory: {}", data_dir.display());
        println!(
            "Oracle committee: {} of {}",
            config.oracle.threshold, config.oracle.committee_size
        );
        if config.rpc.enabled {
            println!("RPC: http://{}", config.rpc.http_addr);
        }
        println!();
        println!("Press Ctrl+C to stop");

        wait_for_shutdown().await;

        info!("Shutting down...");

        node.stop().await;
        pump.await??;

        if let Some(ref mut server) = rpc_server {
            server.stop().await?;
        }

        info!("Node stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C)
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
