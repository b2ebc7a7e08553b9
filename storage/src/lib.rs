//! CIPHERGRID Storage Layer
//!
//! Provides persistent storage for aggregation state.
//!
//! # Architecture
//!
//! The storage layer uses redb (an embedded database) for:
//! - Encrypted observations by sequential id
//! - The granted provider set
//! - The density grid (metadata singleton + one row per cell)
//! - Pending decryption requests awaiting oracle callbacks
//!
//! Each store writes through immediately; the node treats the
//! in-memory engine as authoritative and this layer as its durable
//! mirror, replayed on startup.

pub mod grid;
pub mod observations;
pub mod providers;
pub mod requests;
mod error;

pub use error::{StorageError, StorageResult};
pub use grid::{GridMeta, GridStore};
pub use observations::ObservationStore;
pub use providers::ProviderStore;
pub use requests::RequestStore;

use redb::Database;
use std::path::Path;
use std::sync::Arc;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Database path
    pub path: std::path::PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: std::path::PathBuf::from("./ciphergrid_data/grid.db"),
        }
    }
}

/// Main storage interface
pub struct Storage {
    db: Arc<Database>,
    config: StorageConfig,
    pub observations: ObservationStore,
    pub providers: ProviderStore,
    pub grid: GridStore,
    pub requests: RequestStore,
}

impl Storage {
    /// Open or create storage at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let config = StorageConfig {
            path: path.as_ref().to_path_buf(),
        };
        Self::with_config(config)
    }

    /// Open storage with custom configuration
    pub fn with_config(config: StorageConfig) -> StorageResult<Self> {
        // Ensure directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&config.path)?;
        let db = Arc::new(db);

        // Initialize stores
        let observations = ObservationStore::new(db.clone())?;
        let providers = ProviderStore::new(db.clone())?;
        let grid = GridStore::new(db.clone())?;
        let requests = RequestStore::new(db.clone())?;

        Ok(Self {
            db,
            config,
            observations,
            providers,
            grid,
            requests,
        })
    }

    /// Get storage configuration
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Get database statistics
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            path: self.config.path.clone(),
            observation_count: self.observations.count().unwrap_or(0),
            provider_count: self.providers.count().unwrap_or(0),
            pending_requests: self.requests.count().unwrap_or(0),
            grid_cells: self.grid.cell_count().unwrap_or(0),
        }
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub path: std::path::PathBuf,
    pub observation_count: u64,
    pub provider_count: u64,
    pub pending_requests: u64,
    pub grid_cells: u64,
}
