//! Decryption committee key material
//!
//! The oracle's decryption result is attested by a t-of-n BLS
//! multi-signature: each committee member signs the result digest
//! independently and the signatures are aggregated. A trusted dealer
//! generates the member keys; the public half is what relying parties
//! need for verification.

use blst::min_pk::{AggregateSignature, PublicKey, SecretKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::proof::{decryption_digest, DecryptionProof, DST_DECRYPTION};
use crate::{OracleError, OracleResult, RequestId};

/// Hard cap on committee size
const MAX_COMMITTEE: usize = 256;

/// One committee member's signing key
///
/// The blst secret key zeroizes its scalar on drop.
pub struct OracleSigner {
    /// Member index, stable across the committee's lifetime
    index: u32,
    secret: SecretKey,
    public: PublicKey,
}

impl OracleSigner {
    fn generate<R: RngCore>(index: u32, rng: &mut R) -> OracleResult<Self> {
        let mut ikm = [0u8; 32];
        rng.fill_bytes(&mut ikm);
        let secret = SecretKey::key_gen(&ikm, &[])
            .map_err(|e| OracleError::Crypto(format!("Key generation failed: {:?}", e)))?;
        let public = secret.sk_to_pk();
        Ok(Self {
            index,
            secret,
            public,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn public_key_bytes(&self) -> [u8; 48] {
        self.public.to_bytes()
    }

    /// Sign a decryption result digest
    pub fn sign_digest(&self, digest: &[u8; 32]) -> blst::min_pk::Signature {
        self.secret.sign(digest, DST_DECRYPTION, &[])
    }
}

impl std::fmt::Debug for OracleSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleSigner")
            .field("index", &self.index)
            .field("public", &hex::encode(&self.public.to_bytes()[..8]))
            .finish()
    }
}

/// Distributable public half of a committee
///
/// Holds every member public key by index plus the signing threshold;
/// this is all a verifier needs.
#[derive(Clone, Serialize, Deserialize)]
pub struct CommitteePublic {
    #[serde(with = "member_keys_serde")]
    member_keys: Vec<[u8; 48]>,
    threshold: usize,
}

impl CommitteePublic {
    pub fn member_count(&self) -> usize {
        self.member_keys.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Parse the public key registered at a member index
    pub fn member_key(&self, index: u32) -> Option<PublicKey> {
        let bytes = self.member_keys.get(index as usize)?;
        PublicKey::from_bytes(bytes).ok()
    }
}

impl std::fmt::Debug for CommitteePublic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitteePublic")
            .field("members", &self.member_keys.len())
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Full committee with secret keys (oracle side only)
pub struct OracleCommittee {
    signers: Vec<OracleSigner>,
    threshold: usize,
}

impl OracleCommittee {
    /// Trusted-dealer generation of n members with threshold t
    ///
    /// In production the members would run an interactive ceremony;
    /// the dealer stands in for it here.
    pub fn generate<R: RngCore>(n: usize, t: usize, rng: &mut R) -> OracleResult<Self> {
        if t == 0 {
            return Err(OracleError::InvalidCommittee(
                "Threshold must be at least 1".into(),
            ));
        }
        if t > n {
            return Err(OracleError::InvalidCommittee(
                "Threshold cannot exceed committee size".into(),
            ));
        }
        if n > MAX_COMMITTEE {
            return Err(OracleError::InvalidCommittee(format!(
                "Maximum {} members supported",
                MAX_COMMITTEE
            )));
        }

        let mut signers = Vec::with_capacity(n);
        for index in 0..n {
            signers.push(OracleSigner::generate(index as u32, rng)?);
        }

        Ok(Self {
            signers,
            threshold: t,
        })
    }

    pub fn member_count(&self) -> usize {
        self.signers.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn signers(&self) -> &[OracleSigner] {
        &self.signers
    }

    /// Export the verification half
    pub fn public(&self) -> CommitteePublic {
        CommitteePublic {
            member_keys: self.signers.iter().map(|s| s.public_key_bytes()).collect(),
            threshold: self.threshold,
        }
    }

    /// Produce a proof over a decryption result using the first t members
    pub fn sign(&self, request_id: RequestId, payload: &[u8]) -> OracleResult<DecryptionProof> {
        self.sign_with(&self.default_signer_set(), request_id, payload)
    }

    /// Produce a proof using an explicit member subset
    pub fn sign_with(
        &self,
        indices: &[u32],
        request_id: RequestId,
        payload: &[u8],
    ) -> OracleResult<DecryptionProof> {
        if indices.len() < self.threshold {
            return Err(OracleError::InsufficientSigners {
                got: indices.len(),
                need: self.threshold,
            });
        }

        let digest = decryption_digest(request_id, payload);

        let mut partials = Vec::with_capacity(indices.len());
        for &index in indices {
            let signer = self
                .signers
                .get(index as usize)
                .ok_or_else(|| OracleError::InvalidCommittee(format!("No member {}", index)))?;
            partials.push(signer.sign_digest(&digest));
        }

        let mut agg = AggregateSignature::from_signature(&partials[0]);
        for partial in &partials[1..] {
            agg.add_signature(partial, false)
                .map_err(|e| OracleError::Crypto(format!("Aggregation error: {:?}", e)))?;
        }

        Ok(DecryptionProof::new(indices.to_vec(), agg.to_signature()))
    }

    fn default_signer_set(&self) -> Vec<u32> {
        (0..self.threshold as u32).collect()
    }
}

impl std::fmt::Debug for OracleCommittee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleCommittee")
            .field("members", &self.signers.len())
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Serde helper for Vec<[u8; 48]> (BLS public keys)
mod member_keys_serde {
    use serde::de::{Error, SeqAccess, Visitor};
    use serde::ser::SerializeSeq;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(
        keys: &Vec<[u8; 48]>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(&key.to_vec())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<[u8; 48]>, D::Error> {
        struct MemberKeysVisitor;

        impl<'de> Visitor<'de> for MemberKeysVisitor {
            type Value = Vec<[u8; 48]>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of 48-byte public keys")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut keys = Vec::new();
                while let Some(bytes) = seq.next_element::<Vec<u8>>()? {
                    if bytes.len() != 48 {
                        return Err(A::Error::custom("Invalid public key length"));
                    }
                    let mut arr = [0u8; 48];
                    arr.copy_from_slice(&bytes);
                    keys.push(arr);
                }
                Ok(keys)
            }
        }

        deserializer.deserialize_seq(MemberKeysVisitor)
    }
}
