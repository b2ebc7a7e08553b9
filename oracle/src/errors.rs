//! Oracle error types

use thiserror::Error;

/// Errors that can occur at the oracle boundary
#[derive(Error, Debug)]
pub enum OracleError {
    /// Committee parameters are unusable
    #[error("Invalid committee: {0}")]
    InvalidCommittee(String),

    /// Fewer distinct signers than the committee threshold
    #[error("Insufficient signers: got {got}, need {need}")]
    InsufficientSigners { got: usize, need: usize },

    /// Cleartext payload length is not a whole number of u32 words
    #[error("Misaligned cleartext payload: {len} bytes")]
    MisalignedPayload { len: usize },

    /// Underlying BLS operation failed
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Wire encoding failed
    #[error("Codec error: {0}")]
    Codec(String),

    /// Ciphertext algebra error
    #[error(transparent)]
    Cipher(#[from] ciphergrid_ahe::AheError),
}
