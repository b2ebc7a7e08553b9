//! Ciphertext algebra error types

use thiserror::Error;

/// Errors that can occur in the ciphertext algebra
#[derive(Error, Debug)]
pub enum AheError {
    /// Transport handle could not be encoded or decoded
    #[error("Ciphertext codec error: {0}")]
    Codec(String),

    /// Hex input was not valid
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),
}
