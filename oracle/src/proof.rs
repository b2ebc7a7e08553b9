//! Decryption proof format

use blst::min_pk::Signature;
use serde::{Deserialize, Serialize};

use crate::{OracleError, OracleResult, RequestId};

/// Domain separation tag for decryption attestation signatures
pub(crate) const DST_DECRYPTION: &[u8] =
    b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_CIPHERGRID_DECRYPT_";

/// Domain prefix for the signed result digest
const DIGEST_DOMAIN: &[u8] = b"ciphergrid_decryption_v1";

/// Digest committed to by a decryption proof
///
/// Binds the cleartext payload to the request id it answers, so a
/// proof cannot be replayed against a different pending request.
pub fn decryption_digest(request_id: RequestId, payload: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DIGEST_DOMAIN);
    hasher.update(&request_id.value().to_le_bytes());
    hasher.update(payload);
    *hasher.finalize().as_bytes()
}

/// Committee attestation over one decryption result
///
/// An aggregate BLS signature by the listed member indices over
/// [`decryption_digest`]. The verifier resolves the indices against
/// its registered member keys; the proof itself carries no keys.
#[derive(Clone, Serialize, Deserialize)]
pub struct DecryptionProof {
    /// Committee member indices that signed
    signers: Vec<u32>,
    /// Aggregated BLS signature
    #[serde(with = "signature_serde")]
    signature: Signature,
}

impl DecryptionProof {
    pub(crate) fn new(signers: Vec<u32>, signature: Signature) -> Self {
        Self { signers, signature }
    }

    pub fn signers(&self) -> &[u32] {
        &self.signers
    }

    pub fn signer_count(&self) -> usize {
        self.signers.len()
    }

    pub fn signed_by(&self, index: u32) -> bool {
        self.signers.contains(&index)
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Wire encoding (bincode)
    pub fn to_bytes(&self) -> OracleResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| OracleError::Codec(e.to_string()))
    }

    /// Decode from the wire encoding
    pub fn from_bytes(bytes: &[u8]) -> OracleResult<Self> {
        bincode::deserialize(bytes).map_err(|e| OracleError::Codec(e.to_string()))
    }
}

impl std::fmt::Debug for DecryptionProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionProof")
            .field("signers", &self.signers)
            .finish()
    }
}

/// Serde helper for the BLS signature
mod signature_serde {
    use super::*;
    use serde::de::Error;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sig: &Signature, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&sig.to_bytes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Signature, D::Error> {
        let bytes: Vec<u8> = serde::Deserialize::deserialize(deserializer)?;
        if bytes.len() != 96 {
            return Err(D::Error::custom("Invalid signature length"));
        }
        let mut arr = [0u8; 96];
        arr.copy_from_slice(&bytes);
        Signature::from_bytes(&arr)
            .map_err(|e| D::Error::custom(format!("Invalid signature: {:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_binds_request_id() {
        let payload = b"cleartexts";
        let a = decryption_digest(RequestId::new(1), payload);
        let b = decryption_digest(RequestId::new(2), payload);
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_binds_payload() {
        let id = RequestId::new(9);
        assert_ne!(decryption_digest(id, b"a"), decryption_digest(id, b"b"));
    }

    #[test]
    fn test_digest_is_deterministic() {
        let id = RequestId::new(3);
        assert_eq!(decryption_digest(id, b"x"), decryption_digest(id, b"x"));
    }
}
