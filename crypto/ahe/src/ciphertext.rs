//! Ciphertext and transport handle types
//!
//! A [`Ciphertext`] is a masked u32 word plus the tags of every pad that
//! was folded into it. Homomorphic addition is wrapping addition of the
//! masked words and concatenation of the pad tags, so the tag list grows
//! with each non-trivial operand. A [`CiphertextHandle`] is the opaque
//! byte encoding used on the wire and in storage.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::{AheError, AheResult};

/// Number of bytes in a pad nonce
pub const PAD_NONCE_BYTES: usize = 16;

/// Identifier of one applied mask pad
///
/// The nonce alone is public; the pad value it names can only be
/// re-derived with the oracle's [`MaskKey`](crate::MaskKey).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PadTag([u8; PAD_NONCE_BYTES]);

impl PadTag {
    /// Create a tag from raw nonce bytes
    pub fn from_bytes(bytes: [u8; PAD_NONCE_BYTES]) -> Self {
        Self(bytes)
    }

    /// Get the nonce bytes
    pub fn as_bytes(&self) -> &[u8; PAD_NONCE_BYTES] {
        &self.0
    }
}

impl std::fmt::Debug for PadTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PadTag({})", hex::encode(&self.0[..4]))
    }
}

/// Encrypted u32 accumulator
///
/// Supports homomorphic addition and conversion to/from an opaque
/// transport handle. Structural equality is ciphertext equality, not
/// plaintext equality: two encryptions of the same value under fresh
/// pads compare unequal.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    /// Plaintext plus the sum of all named pads, mod 2^32
    masked: u32,
    /// Tags of every pad folded into `masked`
    pads: Vec<PadTag>,
}

impl Ciphertext {
    pub(crate) fn new(masked: u32, pads: Vec<PadTag>) -> Self {
        Self { masked, pads }
    }

    /// The encrypted zero constant (additive identity)
    pub fn zero() -> Self {
        Self::trivial(0)
    }

    /// Embed a plaintext without masking
    ///
    /// A trivial ciphertext carries no pads; anyone holding it can read
    /// the value. Used where a cleartext re-enters the encrypted domain
    /// (grid-build re-encrypts binned densities this way).
    pub fn trivial(value: u32) -> Self {
        Self {
            masked: value,
            pads: Vec::new(),
        }
    }

    /// True iff no pads are applied
    pub fn is_trivial(&self) -> bool {
        self.pads.is_empty()
    }

    /// Number of pads folded into this accumulator
    pub fn pad_count(&self) -> usize {
        self.pads.len()
    }

    /// Homomorphic addition
    pub fn add_ct(&self, other: &Ciphertext) -> Ciphertext {
        let mut pads = Vec::with_capacity(self.pads.len() + other.pads.len());
        pads.extend_from_slice(&self.pads);
        pads.extend_from_slice(&other.pads);
        Ciphertext {
            masked: self.masked.wrapping_add(other.masked),
            pads,
        }
    }

    pub(crate) fn masked(&self) -> u32 {
        self.masked
    }

    pub(crate) fn pads(&self) -> &[PadTag] {
        &self.pads
    }

    /// Encode to the opaque transport handle
    pub fn to_handle(&self) -> AheResult<CiphertextHandle> {
        let bytes = bincode::serialize(self).map_err(|e| AheError::Codec(e.to_string()))?;
        Ok(CiphertextHandle(bytes))
    }

    /// Decode from a transport handle
    pub fn from_handle(handle: &CiphertextHandle) -> AheResult<Self> {
        bincode::deserialize(&handle.0).map_err(|e| AheError::Codec(e.to_string()))
    }
}

impl Add<&Ciphertext> for &Ciphertext {
    type Output = Ciphertext;

    fn add(self, rhs: &Ciphertext) -> Ciphertext {
        self.add_ct(rhs)
    }
}

impl AddAssign<&Ciphertext> for Ciphertext {
    fn add_assign(&mut self, rhs: &Ciphertext) {
        self.masked = self.masked.wrapping_add(rhs.masked);
        self.pads.extend_from_slice(&rhs.pads);
    }
}

impl std::fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ciphertext")
            .field("pads", &self.pads.len())
            .field("trivial", &self.is_trivial())
            .finish()
    }
}

/// Opaque transport encoding of a ciphertext
///
/// Produced by [`Ciphertext::to_handle`]; the broker and the oracle wire
/// pass these around without inspecting them.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle(Vec<u8>);

impl CiphertextHandle {
    /// Wrap raw handle bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the handle bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the handle bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Hex encoding for RPC/CLI display
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse from hex
    pub fn from_hex(s: &str) -> AheResult<Self> {
        let bytes = hex::decode(s).map_err(|e| AheError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CiphertextHandle")
            .field("len", &self.0.len())
            .finish()
    }
}
