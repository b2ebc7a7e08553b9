//! Node event bus
//!
//! Every completed state change is broadcast as one event, after the
//! engine has mutated and storage has been written through. Slow or
//! absent subscribers never block the node; the channel drops the
//! oldest events when a receiver lags.

use ciphergrid_core::{GridBuilt, MapRevealed, ObservationRecorded, ProviderId};
use ciphergrid_oracle::RequestId;

/// Events broadcast by the node
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// A provider was newly granted submission rights
    ProviderAuthorized { identity: ProviderId },
    /// An encrypted observation was stored
    ObservationStored(ObservationRecorded),
    /// A grid build was handed to the oracle
    GridBuildRequested {
        request_id: RequestId,
        resolution: u32,
        observations: u64,
    },
    /// A grid build callback completed; the map is ready
    GridBuilt(GridBuilt),
    /// A reveal was handed to the oracle
    MapRevealRequested { request_id: RequestId },
    /// The reveal completed; the map values are public
    MapRevealed(MapRevealed),
}
