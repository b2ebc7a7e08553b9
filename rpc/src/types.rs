//! RPC Request and Response Types
//!
//! Binary values cross the wire as hex strings: provider identities
//! are 64 hex chars, ciphertext handles and proofs are variable-length
//! hex. A leading `0x` is accepted everywhere.

use ciphergrid_node::NodeEvent;
use serde::{Deserialize, Serialize};

/// Authorization request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    /// Identity to grant (hex, 32 bytes)
    pub identity: String,
    /// Admin token, required only when the server enforces one
    #[serde(default)]
    pub admin_token: Option<String>,
}

/// Authorization response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    /// Granted identity (hex)
    pub identity: String,
    /// False when the identity was already authorized
    pub newly_granted: bool,
}

/// Observation submission request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitObservationRequest {
    /// Submitting provider (hex, 32 bytes)
    pub provider: String,
    /// Encrypted x coordinate (ciphertext handle, hex)
    pub x: String,
    /// Encrypted y coordinate (ciphertext handle, hex)
    pub y: String,
    /// Encrypted z coordinate (ciphertext handle, hex)
    pub z: String,
    /// Encrypted density (ciphertext handle, hex)
    pub density: String,
}

/// Observation submission response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitObservationResponse {
    /// Assigned sequential observation id
    pub id: u64,
    /// Submitting provider (hex)
    pub provider: String,
}

/// Grid rebuild request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateDensityMapRequest {
    /// Cells per axis (1..=100)
    pub resolution: u32,
    /// Requesting identity (hex, 32 bytes)
    pub caller: String,
}

/// Reveal request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMapRevealRequest {
    /// Requesting identity (hex, 32 bytes)
    pub caller: String,
}

/// Response carrying a decryption request id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdResponse {
    /// Oracle request id
    pub request_id: u64,
}

/// Oracle decryption callback delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionCallbackRequest {
    /// Oracle request id being answered
    pub request_id: u64,
    /// Decrypted payload bytes (hex)
    pub cleartexts: String,
    /// Committee signature proof (hex)
    pub proof: String,
}

/// Grid build result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridBuiltInfo {
    /// Request that produced this build
    pub request_id: u64,
    /// Cells per axis of the built grid
    pub resolution: u32,
    /// Observations binned into the grid
    pub observations: u64,
}

/// Reveal result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRevealedInfo {
    /// Request that produced this reveal
    pub request_id: u64,
    /// Cells per axis
    pub resolution: u32,
    /// Decrypted cell values in linear index order
    pub values: Vec<u32>,
}

/// Node status response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// RPC API version
    pub version: String,
    /// Network name
    pub network: String,
    /// Whether the node loop is running
    pub running: bool,
    /// Stored observation count
    pub observation_count: u64,
    /// Granted provider count
    pub provider_count: usize,
    /// Resolution of the built grid (0 = never built)
    pub resolution: u32,
    /// Resolution the next build callback will allocate
    pub target_resolution: u32,
    /// Whether the grid has been built
    pub map_ready: bool,
    /// Whether the one-shot reveal has completed
    pub revealed: bool,
    /// Decryption requests awaiting callbacks
    pub pending_requests: usize,
    /// Batches queued inside the local oracle
    pub oracle_queue: usize,
}

/// Node event as delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EventInfo {
    ProviderAuthorized {
        identity: String,
    },
    ObservationStored {
        id: u64,
        provider: String,
    },
    GridBuildRequested {
        request_id: u64,
        resolution: u32,
        observations: u64,
    },
    GridBuilt {
        request_id: u64,
        resolution: u32,
        observations: u64,
    },
    MapRevealRequested {
        request_id: u64,
    },
    MapRevealed {
        request_id: u64,
        resolution: u32,
        values: Vec<u32>,
    },
}

impl From<NodeEvent> for EventInfo {
    fn from(event: NodeEvent) -> Self {
        match event {
            NodeEvent::ProviderAuthorized { identity } => EventInfo::ProviderAuthorized {
                identity: identity.to_hex(),
            },
            NodeEvent::ObservationStored(recorded) => EventInfo::ObservationStored {
                id: recorded.id,
                provider: recorded.provider.to_hex(),
            },
            NodeEvent::GridBuildRequested {
                request_id,
                resolution,
                observations,
            } => EventInfo::GridBuildRequested {
                request_id: request_id.value(),
                resolution,
                observations,
            },
            NodeEvent::GridBuilt(built) => EventInfo::GridBuilt {
                request_id: built.request_id.value(),
                resolution: built.resolution,
                observations: built.observations,
            },
            NodeEvent::MapRevealRequested { request_id } => EventInfo::MapRevealRequested {
                request_id: request_id.value(),
            },
            NodeEvent::MapRevealed(revealed) => EventInfo::MapRevealed {
                request_id: revealed.request_id.value(),
                resolution: revealed.resolution,
                values: revealed.values,
            },
        }
    }
}
