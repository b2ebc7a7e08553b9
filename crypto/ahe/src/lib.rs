//! CIPHERGRID Additive Ciphertext Algebra
//!
//! Encrypted u32 values that support homomorphic addition.
//! The scheme is additive masking: a plaintext is hidden under one or
//! more PRF-derived pads, and addition of ciphertexts adds the masked
//! words while concatenating the pad tags. Decryption (oracle-side,
//! requires the [`MaskKey`]) re-derives every pad and subtracts it.
//!
//! Consumers outside the oracle see only three capabilities:
//! - [`Ciphertext::zero`] and [`Ciphertext::add_ct`] (homomorphic algebra)
//! - [`Ciphertext::to_handle`] / [`Ciphertext::from_handle`] (transport)
//!
//! `decrypt(a + b) == decrypt(a).wrapping_add(decrypt(b))` for any two
//! ciphertexts under the same key, in any association order.

pub mod ciphertext;
pub mod errors;
pub mod masking;

pub use ciphertext::{Ciphertext, CiphertextHandle, PadTag};
pub use errors::AheError;
pub use masking::{MaskKey, MASK_KEY_BYTES};

/// Result type for ciphertext algebra operations
pub type AheResult<T> = Result<T, AheError>;

/// Width of the plaintext domain in bits
pub const PLAINTEXT_BITS: u32 = 32;
