//! RPC Error Types

use ciphergrid_core::CoreError;
use ciphergrid_node::NodeError;
use jsonrpsee::types::ErrorObjectOwned;
use thiserror::Error;

/// RPC error codes following JSON-RPC 2.0 spec + custom CIPHERGRID codes
#[derive(Debug, Clone, Copy)]
pub enum RpcErrorCode {
    // Standard JSON-RPC errors
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,

    // CIPHERGRID custom errors (-32000 to -32099)
    Unauthorized = -32000,
    InvalidResolution = -32001,
    AlreadyRevealed = -32002,
    UnknownRequest = -32003,
    InvalidRequestKind = -32004,
    InvalidProof = -32005,
    MalformedCleartexts = -32006,
    StorageFailed = -32007,
    OracleFailed = -32008,
    AdminRequired = -32009,
}

impl RpcErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// RPC errors
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Unauthorized provider: {0}")]
    Unauthorized(String),

    #[error("Invalid resolution: {0}")]
    InvalidResolution(u32),

    #[error("Map already revealed")]
    AlreadyRevealed,

    #[error("Unknown request: {0}")]
    UnknownRequest(u64),

    #[error("Invalid request kind: {0}")]
    InvalidRequestKind(String),

    #[error("Invalid decryption proof for request {0}")]
    InvalidProof(u64),

    #[error("Malformed cleartexts: {0}")]
    MalformedCleartexts(String),

    #[error("Storage failed: {0}")]
    StorageFailed(String),

    #[error("Oracle failed: {0}")]
    OracleFailed(String),

    #[error("Admin token required")]
    AdminRequired,

    #[error("Server error: {0}")]
    ServerError(String),
}

impl From<RpcError> for ErrorObjectOwned {
    fn from(err: RpcError) -> Self {
        let message = err.to_string();
        let code = match &err {
            RpcError::InvalidParams(_) => RpcErrorCode::InvalidParams,
            RpcError::InternalError(_) => RpcErrorCode::InternalError,
            RpcError::Unauthorized(_) => RpcErrorCode::Unauthorized,
            RpcError::InvalidResolution(_) => RpcErrorCode::InvalidResolution,
            RpcError::AlreadyRevealed => RpcErrorCode::AlreadyRevealed,
            RpcError::UnknownRequest(_) => RpcErrorCode::UnknownRequest,
            RpcError::InvalidRequestKind(_) => RpcErrorCode::InvalidRequestKind,
            RpcError::InvalidProof(_) => RpcErrorCode::InvalidProof,
            RpcError::MalformedCleartexts(_) => RpcErrorCode::MalformedCleartexts,
            RpcError::StorageFailed(_) => RpcErrorCode::StorageFailed,
            RpcError::OracleFailed(_) => RpcErrorCode::OracleFailed,
            RpcError::AdminRequired => RpcErrorCode::AdminRequired,
            RpcError::ServerError(_) => RpcErrorCode::InternalError,
        };

        ErrorObjectOwned::owned(code.code(), message, None::<()>)
    }
}

impl From<NodeError> for RpcError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Core(core) => match core {
                CoreError::Unauthorized(identity) => RpcError::Unauthorized(identity.to_string()),
                CoreError::InvalidResolution(resolution) => {
                    RpcError::InvalidResolution(resolution)
                }
                CoreError::AlreadyRevealed => RpcError::AlreadyRevealed,
                CoreError::UnknownRequest(request_id) => {
                    RpcError::UnknownRequest(request_id.value())
                }
                CoreError::InvalidRequest { .. } => {
                    RpcError::InvalidRequestKind(core.to_string())
                }
                CoreError::InvalidProof(request_id) => RpcError::InvalidProof(request_id.value()),
                CoreError::MalformedCleartexts { .. } => {
                    RpcError::MalformedCleartexts(core.to_string())
                }
                other => RpcError::InternalError(other.to_string()),
            },
            NodeError::Storage(e) => RpcError::StorageFailed(e.to_string()),
            NodeError::Oracle(e) => RpcError::OracleFailed(e.to_string()),
            other => RpcError::InternalError(other.to_string()),
        }
    }
}

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;
