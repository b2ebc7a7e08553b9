//! Phase-1 submission boundary

use ciphergrid_ahe::CiphertextHandle;
use serde::{Deserialize, Serialize};

use crate::OracleResult;

/// Oracle-issued identifier of one decryption request
///
/// Ids are unique per oracle and start at 1; 0 is never issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One batch of handles awaiting threshold decryption
#[derive(Clone, Debug)]
pub struct DecryptionBatch {
    /// The id the oracle assigned on submission
    pub request_id: RequestId,
    /// Handles in submission order; the cleartext reply preserves it
    pub handles: Vec<CiphertextHandle>,
}

/// Submission side of the two-phase decryption protocol
///
/// Implementations enqueue the batch and return the assigned id
/// immediately; the decrypted reply arrives later as a separate
/// callback. An implementation must never block the caller on the
/// decryption itself.
pub trait OracleClient: Send + Sync {
    fn submit_batch(&self, handles: Vec<CiphertextHandle>) -> OracleResult<RequestId>;
}
