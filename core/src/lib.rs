//! CIPHERGRID Aggregation Core
//!
//! The encrypted-aggregation state machine: providers submit encrypted
//! (x, y, z, density) observations, the engine bins them into a shared
//! density grid homomorphically, and the finished grid is revealed at
//! most once through the oracle's two-phase decryption protocol.
//!
//! # Architecture
//! ```text
//! providers ──▶ ObservationRegistry ──┐
//!                                     │ snapshot (id order)
//!                                     ▼
//!                          AggregationEngine
//!                          │                ▲
//!                  issue   │                │ callback
//!                          ▼                │
//!                        DecryptionBroker ──┘
//!                          │         ▲
//!                          ▼         │ cleartexts + proof
//!                      [external decryption oracle]
//!
//!                          DensityGrid (allocate / accumulate / reveal)
//! ```
//!
//! The core is a sequential state machine: no internal threads, no
//! blocking on the oracle. Requests go out through the injected
//! [`OracleClient`](ciphergrid_oracle::OracleClient); replies come back
//! as explicit callback calls carrying `(requestId, cleartexts, proof)`.

pub mod broker;
pub mod engine;
pub mod errors;
pub mod grid;
pub mod registry;
pub mod types;

pub use broker::{DecryptionBroker, ResolvedRequest};
pub use engine::{AggregationEngine, OBSERVATION_FIELDS};
pub use errors::CoreError;
pub use grid::{DensityGrid, MAX_RESOLUTION};
pub use registry::{ObservationRegistry, ProviderSet};
pub use types::{
    GridBuilt, MapRevealed, Observation, ObservationRecorded, PendingRequest, ProviderId,
    RequestKind,
};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
