//! Fail-closed proof verification

use blst::min_pk::{AggregatePublicKey, PublicKey};
use blst::BLST_ERROR;
use std::collections::HashSet;

use crate::committee::CommitteePublic;
use crate::proof::{decryption_digest, DecryptionProof, DST_DECRYPTION};
use crate::RequestId;

/// Signature-verification primitive consumed by the decryption broker
///
/// Returns true only if `proof` attests that the committee decrypted
/// `payload` as the answer to `request_id`. Every failure mode
/// (unknown signer, duplicate signer, below threshold, bad signature)
/// is a plain `false`.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, request_id: RequestId, payload: &[u8], proof: &DecryptionProof) -> bool;
}

/// Verifier backed by a registered committee
#[derive(Clone, Debug)]
pub struct CommitteeVerifier {
    committee: CommitteePublic,
}

impl CommitteeVerifier {
    pub fn new(committee: CommitteePublic) -> Self {
        Self { committee }
    }

    pub fn committee(&self) -> &CommitteePublic {
        &self.committee
    }
}

impl ProofVerifier for CommitteeVerifier {
    fn verify(&self, request_id: RequestId, payload: &[u8], proof: &DecryptionProof) -> bool {
        let signers = proof.signers();

        let mut seen = HashSet::with_capacity(signers.len());
        if !signers.iter().all(|index| seen.insert(*index)) {
            return false;
        }
        if signers.len() < self.committee.threshold() {
            return false;
        }

        let mut keys: Vec<PublicKey> = Vec::with_capacity(signers.len());
        for &index in signers {
            match self.committee.member_key(index) {
                Some(key) => keys.push(key),
                None => return false,
            }
        }

        let key_refs: Vec<&PublicKey> = keys.iter().collect();
        let agg_key = match AggregatePublicKey::aggregate(&key_refs, false) {
            Ok(agg) => agg.to_public_key(),
            Err(_) => return false,
        };

        let digest = decryption_digest(request_id, payload);
        let result = proof
            .signature()
            .verify(true, &digest, DST_DECRYPTION, &[], &agg_key, true);

        result == BLST_ERROR::BLST_SUCCESS
    }
}
