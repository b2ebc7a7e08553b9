//! CIPHERGRID Decryption Oracle Boundary
//!
//! The aggregation core never decrypts anything itself. It submits
//! batches of ciphertext handles to an oracle (phase 1) and later
//! receives a callback carrying cleartext bytes plus a committee
//! signature over them (phase 2). This crate defines that boundary:
//!
//! - [`OracleClient`]: the phase-1 submission trait (enqueue-only,
//!   never blocks on decryption)
//! - [`DecryptionProof`] / [`CommitteeVerifier`]: the BLS multi-signature
//!   proof format and its fail-closed verification
//! - [`OracleCommittee`]: trusted-dealer key generation for n members
//!   with a signing threshold t
//! - [`LocalOracle`]: an in-process oracle for development and tests
//!   that holds the mask key and answers queued batches
//!
//! A production deployment replaces [`LocalOracle`] with an RPC client
//! behind the same [`OracleClient`] trait; the proof format and the
//! verifier stay as they are.

pub mod client;
pub mod codec;
pub mod committee;
pub mod errors;
pub mod local;
pub mod proof;
pub mod verifier;

pub use client::{DecryptionBatch, OracleClient, RequestId};
pub use codec::{decode_cleartexts, encode_cleartexts};
pub use committee::{CommitteePublic, OracleCommittee, OracleSigner};
pub use errors::OracleError;
pub use local::{DecryptionCallback, LocalOracle};
pub use proof::{decryption_digest, DecryptionProof};
pub use verifier::{CommitteeVerifier, ProofVerifier};

/// Oracle committee configuration
#[derive(Clone, Debug)]
pub struct OracleConfig {
    /// Number of committee members
    pub committee_size: usize,
    /// Signatures required for a valid proof (t of n)
    pub threshold: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            committee_size: 3,
            threshold: 2,
        }
    }
}

/// Result type for oracle operations
pub type OracleResult<T> = Result<T, OracleError>;
