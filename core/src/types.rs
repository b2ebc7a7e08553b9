//! Core data model

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};
use ciphergrid_ahe::Ciphertext;
use ciphergrid_oracle::RequestId;

/// Number of bytes in a provider identity
pub const PROVIDER_ID_BYTES: usize = 32;

/// Opaque 32-byte provider identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId([u8; PROVIDER_ID_BYTES]);

impl ProviderId {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; PROVIDER_ID_BYTES]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; PROVIDER_ID_BYTES] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string
    pub fn from_hex(s: &str) -> CoreResult<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidIdentity(e.to_string()))?;
        let arr: [u8; PROVIDER_ID_BYTES] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidIdentity("expected 32 bytes".into()))?;
        Ok(Self(arr))
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProviderId({}…)", hex::encode(&self.0[..4]))
    }
}

/// Which operation a decryption request was issued for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Rebuild the density grid from all observations
    GridBuild,
    /// Decrypt the finished grid
    Reveal,
}

/// One submitted encrypted observation
///
/// Immutable once created. Ids are assigned sequentially starting at 1;
/// 0 denotes "absent" and is never stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Observation {
    pub id: u64,
    pub provider: ProviderId,
    pub encrypted_x: Ciphertext,
    pub encrypted_y: Ciphertext,
    pub encrypted_z: Ciphertext,
    pub encrypted_density: Ciphertext,
    /// Logical clock value supplied at submission
    pub timestamp: u64,
}

/// A decryption request awaiting its callback
///
/// Created at issue time, consumed exactly once when a callback passes
/// all validation. An entry whose callback never arrives stays pending
/// forever; there is no timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub request_id: RequestId,
    pub kind: RequestKind,
    pub initiator: ProviderId,
}

/// Notification value returned by a successful submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObservationRecorded {
    pub id: u64,
    pub provider: ProviderId,
}

/// Summary of a completed grid build
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBuilt {
    pub request_id: RequestId,
    pub initiator: ProviderId,
    pub resolution: u32,
    /// Observations binned into the fresh grid
    pub observations: u64,
}

/// Summary of a completed reveal
///
/// Carries the decrypted cell values in flatten order. They are
/// surfaced here once and are not written back into the grid, which
/// keeps holding ciphertexts after reveal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapRevealed {
    pub request_id: RequestId,
    pub initiator: ProviderId,
    pub resolution: u32,
    pub values: Vec<u32>,
}
