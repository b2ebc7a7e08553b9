//! CIPHERGRID: Confidential Spatial Aggregation
//!
//! This is the root crate that re-exports all CIPHERGRID components for
//! integration testing and provides unified access to the protocol primitives.
//!
//! ## Architecture Overview
//!
//! CIPHERGRID aggregates private spatial observations into a shared 3D
//! density map without any single submission ever being visible in the
//! clear:
//!
//! - **Additive Ciphertext Algebra**: encrypted u32 values that support
//!   homomorphic addition, decryptable only by the oracle committee
//! - **Density Grid**: a cubic grid of encrypted cells rebuilt on demand
//!   from every stored observation
//! - **Two-Phase Decryption**: batches go out to a threshold committee,
//!   cleartexts come back with a BLS proof that is verified fail-closed
//! - **One-Shot Reveal**: the finished map can be made public at most once
//! - **Write-Through Persistence**: every accepted operation lands in redb
//!   before it is announced, so a restart resumes mid-protocol
//!
//! ## Crate Organization
//!
//! - `ciphergrid-ahe`: additive masking scheme and ciphertext handles
//! - `ciphergrid-oracle`: decryption oracle boundary, committee, proofs
//! - `ciphergrid-core`: observation registry, density grid, aggregation engine
//! - `ciphergrid-storage`: redb-backed durable store
//! - `ciphergrid-node`: the node service gluing engine, store and oracle
//! - `ciphergrid-rpc`: JSON-RPC server surface

// Re-export all crates for integration testing
pub use ciphergrid_ahe as ahe;
pub use ciphergrid_core as core;
pub use ciphergrid_node as node;
pub use ciphergrid_oracle as oracle;
pub use ciphergrid_rpc as rpc;
pub use ciphergrid_storage as storage;

/// CIPHERGRID protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol configuration
pub mod config {
    /// Default oracle committee size
    pub const DEFAULT_COMMITTEE_SIZE: usize = 3;

    /// Majority threshold for a committee of `n`
    pub fn default_threshold(n: usize) -> usize {
        n / 2 + 1
    }

    /// Masking scheme parameters
    pub mod scheme {
        pub use ciphergrid_ahe::ciphertext::PAD_NONCE_BYTES;
        pub use ciphergrid_ahe::{MASK_KEY_BYTES, PLAINTEXT_BITS};
    }

    /// Grid limits
    pub mod grid {
        pub use ciphergrid_core::{MAX_RESOLUTION, OBSERVATION_FIELDS};
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use ciphergrid_ahe::{Ciphertext, CiphertextHandle, MaskKey};
    pub use ciphergrid_core::{
        AggregationEngine, DensityGrid, GridBuilt, MapRevealed, Observation, ProviderId,
    };
    pub use ciphergrid_node::{GridNode, NodeConfig, NodeError, NodeEvent};
    pub use ciphergrid_oracle::{
        CommitteeVerifier, LocalOracle, OracleClient, OracleConfig, ProofVerifier, RequestId,
    };
    pub use ciphergrid_rpc::{GridContext, RpcConfig, RpcServer};
    pub use ciphergrid_storage::Storage;
}
