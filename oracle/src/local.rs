//! In-process oracle for development and tests
//!
//! Plays the external oracle's role end to end: accepts batches
//! (phase 1), and on demand decrypts a queued batch, encodes the
//! cleartext payload, and signs it with the committee (producing the
//! phase-2 callback triple). Nothing here blocks: submission enqueues,
//! answering is an explicit separate step driven by the node's pump
//! or by a test.

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use ciphergrid_ahe::{Ciphertext, CiphertextHandle, MaskKey};

use crate::client::{DecryptionBatch, OracleClient, RequestId};
use crate::codec::encode_cleartexts;
use crate::committee::OracleCommittee;
use crate::proof::DecryptionProof;
use crate::verifier::CommitteeVerifier;
use crate::{OracleConfig, OracleResult};

/// The phase-2 callback triple
#[derive(Clone, Debug)]
pub struct DecryptionCallback {
    pub request_id: RequestId,
    /// Little-endian u32 words, one per submitted handle, in order
    pub cleartexts: Vec<u8>,
    pub proof: DecryptionProof,
}

/// Development oracle holding the mask key and the signing committee
pub struct LocalOracle {
    key: MaskKey,
    committee: OracleCommittee,
    next_id: AtomicU64,
    queue: Mutex<VecDeque<DecryptionBatch>>,
}

impl LocalOracle {
    /// Generate a fresh oracle (new mask key + committee)
    pub fn new(config: &OracleConfig) -> OracleResult<Self> {
        let mut rng = ChaCha20Rng::from_entropy();
        let key = MaskKey::generate(&mut rng);
        let committee = OracleCommittee::generate(config.committee_size, config.threshold, &mut rng)?;
        Ok(Self::with_parts(key, committee))
    }

    /// Build from existing key material
    pub fn with_parts(key: MaskKey, committee: OracleCommittee) -> Self {
        Self {
            key,
            committee,
            next_id: AtomicU64::new(1),
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// The mask key, for provider-side encryption in tests and demos
    pub fn mask_key(&self) -> &MaskKey {
        &self.key
    }

    pub fn committee(&self) -> &OracleCommittee {
        &self.committee
    }

    /// Verifier for this oracle's proofs
    pub fn verifier(&self) -> CommitteeVerifier {
        CommitteeVerifier::new(self.committee.public())
    }

    /// Number of batches awaiting an answer
    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }

    /// Drain every queued batch
    pub fn take_pending(&self) -> Vec<DecryptionBatch> {
        self.queue.lock().drain(..).collect()
    }

    /// Decrypt a batch and sign the result
    pub fn answer(&self, batch: &DecryptionBatch) -> OracleResult<DecryptionCallback> {
        let mut values = Vec::with_capacity(batch.handles.len());
        for handle in &batch.handles {
            let ct = Ciphertext::from_handle(handle)?;
            values.push(self.key.decrypt(&ct));
        }

        let cleartexts = encode_cleartexts(&values);
        let proof = self.committee.sign(batch.request_id, &cleartexts)?;

        Ok(DecryptionCallback {
            request_id: batch.request_id,
            cleartexts,
            proof,
        })
    }

    /// Answer the oldest queued batch, if any
    pub fn respond_next(&self) -> OracleResult<Option<DecryptionCallback>> {
        let batch = self.queue.lock().pop_front();
        match batch {
            Some(batch) => Ok(Some(self.answer(&batch)?)),
            None => Ok(None),
        }
    }
}

impl OracleClient for LocalOracle {
    fn submit_batch(&self, handles: Vec<CiphertextHandle>) -> OracleResult<RequestId> {
        let request_id = RequestId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.queue.lock().push_back(DecryptionBatch {
            request_id,
            handles,
        });
        Ok(request_id)
    }
}

impl std::fmt::Debug for LocalOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalOracle")
            .field("committee", &self.committee)
            .field("queued", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::ProofVerifier;

    fn test_oracle() -> LocalOracle {
        LocalOracle::new(&OracleConfig::default()).unwrap()
    }

    fn encrypt_all(oracle: &LocalOracle, values: &[u32]) -> Vec<CiphertextHandle> {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        values
            .iter()
            .map(|&v| {
                oracle
                    .mask_key()
                    .encrypt(v, &mut rng)
                    .to_handle()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_ids_are_sequential_from_one() {
        let oracle = test_oracle();
        assert_eq!(oracle.submit_batch(vec![]).unwrap(), RequestId::new(1));
        assert_eq!(oracle.submit_batch(vec![]).unwrap(), RequestId::new(2));
        assert_eq!(oracle.pending_count(), 2);
    }

    #[test]
    fn test_answer_decrypts_in_order() {
        let oracle = test_oracle();
        let handles = encrypt_all(&oracle, &[10, 20, 30]);
        oracle.submit_batch(handles).unwrap();

        let callback = oracle.respond_next().unwrap().unwrap();
        assert_eq!(callback.request_id, RequestId::new(1));
        assert_eq!(
            crate::codec::decode_cleartexts(&callback.cleartexts).unwrap(),
            vec![10, 20, 30]
        );
        assert_eq!(oracle.pending_count(), 0);
    }

    #[test]
    fn test_answer_proof_verifies() {
        let oracle = test_oracle();
        let verifier = oracle.verifier();
        oracle.submit_batch(encrypt_all(&oracle, &[7])).unwrap();

        let callback = oracle.respond_next().unwrap().unwrap();
        assert!(verifier.verify(callback.request_id, &callback.cleartexts, &callback.proof));
    }

    #[test]
    fn test_empty_batch_answer() {
        let oracle = test_oracle();
        oracle.submit_batch(vec![]).unwrap();

        let callback = oracle.respond_next().unwrap().unwrap();
        assert!(callback.cleartexts.is_empty());
        assert!(oracle
            .verifier()
            .verify(callback.request_id, &callback.cleartexts, &callback.proof));
    }

    #[test]
    fn test_respond_next_on_empty_queue() {
        let oracle = test_oracle();
        assert!(oracle.respond_next().unwrap().is_none());
    }

    #[test]
    fn test_take_pending_drains() {
        let oracle = test_oracle();
        oracle.submit_batch(vec![]).unwrap();
        oracle.submit_batch(vec![]).unwrap();

        let batches = oracle.take_pending();
        assert_eq!(batches.len(), 2);
        assert_eq!(oracle.pending_count(), 0);
    }
}
