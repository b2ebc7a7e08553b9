//! Cleartext payload codec
//!
//! Oracle replies carry decrypted values as a flat byte payload: each
//! u32 as four little-endian bytes, in batch order. The proof signs
//! the payload bytes, so both sides must agree on this encoding.

use crate::{OracleError, OracleResult};

/// Bytes per cleartext word
pub const WORD_BYTES: usize = 4;

/// Encode u32 values to the wire payload
pub fn encode_cleartexts(values: &[u32]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(values.len() * WORD_BYTES);
    for value in values {
        payload.extend_from_slice(&value.to_le_bytes());
    }
    payload
}

/// Decode the wire payload back to u32 values
///
/// Fails if the payload is not a whole number of words; an honest
/// oracle never produces such a payload.
pub fn decode_cleartexts(payload: &[u8]) -> OracleResult<Vec<u32>> {
    if payload.len() % WORD_BYTES != 0 {
        return Err(OracleError::MisalignedPayload {
            len: payload.len(),
        });
    }

    Ok(payload
        .chunks_exact(WORD_BYTES)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
