//! CIPHERGRID JSON-RPC 2.0 Server
//!
//! Provides HTTP and WebSocket RPC endpoints for node interaction.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  CIPHERGRID RPC Server                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │   HTTP/WS    │  │   Method     │  │   Hex DTO    │       │
//! │  │   Server     │──│   Router     │──│   Codec      │       │
//! │  └──────────────┘  └──────────────┘  └──────────────┘       │
//! │         │                                    │              │
//! │         └────────────────────────────────────┘              │
//! │                          │                                  │
//! │                 ┌────────▼────────┐                         │
//! │                 │    GridNode     │                         │
//! │                 └─────────────────┘                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Supported Methods
//!
//! ## Registry
//! - `grid_authorize` - Grant submission rights to an identity
//! - `grid_submitObservation` - Submit an encrypted observation
//! - `grid_observationCount` - Get stored observation count
//!
//! ## Aggregation
//! - `grid_calculateDensityMap` - Start a grid rebuild
//! - `grid_requestMapReveal` - Ask the oracle to decrypt the map
//! - `grid_gridBuildCallback` - Deliver a grid-build decryption result
//! - `grid_revealCallback` - Deliver a reveal decryption result
//! - `grid_isMapReady` - Check whether the grid has been built
//!
//! ## Node
//! - `grid_status` - Get node status
//! - `grid_version` - Get API version
//! - `grid_subscribeEvents` - Subscribe to node events (WebSocket)

pub mod errors;
pub mod server;
pub mod methods;
pub mod types;

pub use errors::{RpcError, RpcErrorCode, RpcResult};
pub use server::{GridContext, RpcConfig, RpcServer};
pub use types::*;

/// RPC API version
pub const RPC_VERSION: &str = "1.0.0";

/// Default RPC port
pub const DEFAULT_RPC_PORT: u16 = 8545;
