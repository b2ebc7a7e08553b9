//! Node errors

use thiserror::Error;

/// Node result type
pub type NodeResult<T> = Result<T, NodeError>;

/// Node errors
#[derive(Error, Debug)]
pub enum NodeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] ciphergrid_storage::StorageError),

    /// Aggregation error
    #[error("Aggregation error: {0}")]
    Core(#[from] ciphergrid_core::CoreError),

    /// Oracle error
    #[error("Oracle error: {0}")]
    Oracle(#[from] ciphergrid_oracle::OracleError),

    /// State error
    #[error("State error: {0}")]
    State(String),
}
