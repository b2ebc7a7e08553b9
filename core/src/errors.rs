//! Core error taxonomy
//!
//! Every failure is a local, terminal, typed result for the call that
//! triggered it; the core retries nothing. No variant is raised after
//! a call has started mutating state (fail-fast before mutation).

use thiserror::Error;

use crate::types::{ProviderId, RequestKind};
use ciphergrid_oracle::RequestId;

/// Errors that can occur in the aggregation core
#[derive(Error, Debug)]
pub enum CoreError {
    /// Submitting identity is not in the provider authorization set
    #[error("Provider {0} is not authorized")]
    Unauthorized(ProviderId),

    /// Resolution outside 1..=100
    #[error("Invalid resolution {0}: must be between 1 and 100")]
    InvalidResolution(u32),

    /// The grid has already been revealed
    #[error("Density map already revealed")]
    AlreadyRevealed,

    /// Callback for a request that was never issued or already consumed
    #[error("Unknown decryption request {0}")]
    UnknownRequest(RequestId),

    /// Callback delivered to the wrong operation kind
    #[error("Request {request_id} was issued for {actual:?}, not {expected:?}")]
    InvalidRequest {
        request_id: RequestId,
        expected: RequestKind,
        actual: RequestKind,
    },

    /// Oracle proof failed verification
    #[error("Invalid decryption proof for request {0}")]
    InvalidProof(RequestId),

    /// Cleartext payload does not decode to the expected shape
    #[error("Malformed cleartexts for request {request_id}: {reason}")]
    MalformedCleartexts {
        request_id: RequestId,
        reason: String,
    },

    /// Identity string could not be parsed
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Ciphertext algebra failure
    #[error(transparent)]
    Cipher(#[from] ciphergrid_ahe::AheError),

    /// Oracle submission failure
    #[error(transparent)]
    Oracle(#[from] ciphergrid_oracle::OracleError),
}
