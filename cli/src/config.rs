//! Node Configuration
//!
//! Handles loading and saving node configuration from TOML files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Full node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridConfig {
    /// General node settings
    #[serde(default)]
    pub node: NodeSettings,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// RPC settings
    #[serde(default)]
    pub rpc: RpcSettings,

    /// Oracle committee settings
    #[serde(default)]
    pub oracle: OracleSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl GridConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Create configuration for a named network
    pub fn for_network(network: &str) -> Self {
        let mut config = Self::default();
        config.node.network = network.to_string();
        config
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.oracle.threshold > self.oracle.committee_size {
            return Err(ConfigError::Invalid(
                "Oracle threshold cannot exceed committee size".to_string(),
            ));
        }

        if self.oracle.threshold == 0 {
            return Err(ConfigError::Invalid(
                "Oracle threshold must be greater than 0".to_string(),
            ));
        }

        if self.node.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// General node settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Network name
    pub network: String,

    /// Node name for identification
    pub name: Option<String>,

    /// Oracle pump poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Event broadcast channel capacity
    pub event_buffer: usize,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            network: "local".to_string(),
            name: None,
            poll_interval_ms: 100,
            event_buffer: 256,
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Database file name within the data directory
    pub file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            file: "grid.db".to_string(),
        }
    }
}

/// RPC settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSettings {
    /// Enable RPC server
    pub enabled: bool,

    /// HTTP/WebSocket bind address
    pub http_addr: String,

    /// Enable CORS
    pub cors_enabled: bool,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,

    /// Require a token for grid_authorize
    pub require_admin_auth: bool,

    /// Admin token
    pub admin_token: Option<String>,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            http_addr: "127.0.0.1:8545".to_string(),
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            require_admin_auth: false,
            admin_token: None,
        }
    }
}

/// Oracle committee settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSettings {
    /// Number of committee members
    pub committee_size: usize,

    /// Signatures required for a valid proof
    pub threshold: usize,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            committee_size: 3,
            threshold: 2,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,

    /// Output format (text, json)
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Get default data directory
pub fn default_data_dir(network: &str) -> PathBuf {
    let base = directories::ProjectDirs::from("dev", "ciphergrid", "ciphergrid")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".ciphergrid"));

    base.join(network)
}

/// Get default config file path
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("ciphergrid.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = GridConfig::default();
        assert_eq!(config.node.network, "local");
        assert_eq!(config.oracle.committee_size, 3);
        assert_eq!(config.oracle.threshold, 2);
        assert!(config.rpc.enabled);
    }

    #[test]
    fn test_for_network() {
        let config = GridConfig::for_network("staging");
        assert_eq!(config.node.network, "staging");
        assert_eq!(config.storage.file, "grid.db");
    }

    #[test]
    fn test_save_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ciphergrid.toml");

        let config = GridConfig::for_network("local");
        config.save(&path).unwrap();

        let loaded = GridConfig::load(&path).unwrap();
        assert_eq!(loaded.node.network, "local");
        assert_eq!(loaded.rpc.http_addr, "127.0.0.1:8545");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GridConfig = toml::from_str(
            r#"
            [oracle]
            committee_size = 5
            threshold = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.oracle.committee_size, 5);
        assert_eq!(config.node.network, "local");
        assert_eq!(config.node.poll_interval_ms, 100);
    }

    #[test]
    fn test_invalid_threshold() {
        let config = GridConfig {
            oracle: OracleSettings {
                committee_size: 3,
                threshold: 5, // Invalid: threshold > committee_size
            },
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = GridConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
