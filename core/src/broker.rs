//! Two-phase decryption request broker
//!
//! Phase 1 ([`DecryptionBroker::issue`]) submits a batch of transport
//! handles to the oracle and records the returned id as a
//! [`PendingRequest`]. Phase 2 ([`DecryptionBroker::resolve`]) matches
//! a callback back to its pending entry and consumes it at most once.
//!
//! Consumption is gated on every validation: an unknown id, a kind
//! mismatch, a failed proof, or an undecodable payload all leave the
//! pending table untouched, so the oracle can resubmit a corrected
//! callback for the same id. Per request the lifecycle is
//! `Issued -> Consumed`, or pending forever if no callback ever lands;
//! there is no expiry.
//!
//! The broker never sees plaintext it can act on by itself: it hands
//! the decoded values to the caller together with the entry's kind and
//! initiator and forgets them.

use std::collections::HashMap;

use crate::types::{PendingRequest, ProviderId, RequestKind};
use crate::{CoreError, CoreResult};
use ciphergrid_ahe::CiphertextHandle;
use ciphergrid_oracle::{decode_cleartexts, DecryptionProof, OracleClient, ProofVerifier, RequestId};

/// A validated callback, decoded and correlated to its origin
#[derive(Clone, Debug)]
pub struct ResolvedRequest {
    pub request_id: RequestId,
    pub kind: RequestKind,
    pub initiator: ProviderId,
    /// Decoded cleartext words in submission order
    pub values: Vec<u32>,
}

/// Pending-request table plus the request/callback protocol
#[derive(Default)]
pub struct DecryptionBroker {
    pending: HashMap<RequestId, PendingRequest>,
}

impl DecryptionBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries
    pub fn restore<I: IntoIterator<Item = PendingRequest>>(entries: I) -> Self {
        Self {
            pending: entries
                .into_iter()
                .map(|entry| (entry.request_id, entry))
                .collect(),
        }
    }

    /// Phase 1: submit a handle batch and record the pending request
    ///
    /// The batch may be empty (zero observations make a zero-length
    /// request). Never blocks on the reply.
    pub fn issue(
        &mut self,
        client: &dyn OracleClient,
        handles: Vec<CiphertextHandle>,
        kind: RequestKind,
        initiator: ProviderId,
    ) -> CoreResult<RequestId> {
        let request_id = client.submit_batch(handles)?;
        self.pending.insert(
            request_id,
            PendingRequest {
                request_id,
                kind,
                initiator,
            },
        );
        Ok(request_id)
    }

    /// Phase 2, non-consuming half: validate a callback fully
    ///
    /// Checks, in order: the entry exists (`UnknownRequest`), it was
    /// issued for `expected` (`InvalidRequest`), the proof covers the
    /// payload and id (`InvalidProof`), and the payload decodes to
    /// whole words (`MalformedCleartexts`). Leaves the entry pending.
    pub fn validate(
        &self,
        verifier: &dyn ProofVerifier,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &DecryptionProof,
        expected: RequestKind,
    ) -> CoreResult<ResolvedRequest> {
        let entry = *self
            .pending
            .get(&request_id)
            .ok_or(CoreError::UnknownRequest(request_id))?;

        if entry.kind != expected {
            return Err(CoreError::InvalidRequest {
                request_id,
                expected,
                actual: entry.kind,
            });
        }

        if !verifier.verify(request_id, cleartexts, proof) {
            return Err(CoreError::InvalidProof(request_id));
        }

        let values = decode_cleartexts(cleartexts).map_err(|e| CoreError::MalformedCleartexts {
            request_id,
            reason: e.to_string(),
        })?;

        Ok(ResolvedRequest {
            request_id,
            kind: entry.kind,
            initiator: entry.initiator,
            values,
        })
    }

    /// Phase 2, consuming half: delete a pending entry
    ///
    /// Pairs with [`validate`](Self::validate); the caller consumes
    /// only once its own post-validation checks have passed, so a
    /// failure on its side still leaves the request resubmittable.
    pub fn consume(&mut self, request_id: RequestId) -> CoreResult<PendingRequest> {
        self.pending
            .remove(&request_id)
            .ok_or(CoreError::UnknownRequest(request_id))
    }

    /// Phase 2: validate and consume in one step
    pub fn resolve(
        &mut self,
        verifier: &dyn ProofVerifier,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &DecryptionProof,
        expected: RequestKind,
    ) -> CoreResult<ResolvedRequest> {
        let resolved = self.validate(verifier, request_id, cleartexts, proof, expected)?;
        self.consume(request_id)?;
        Ok(resolved)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, request_id: RequestId) -> bool {
        self.pending.contains_key(&request_id)
    }

    pub fn get(&self, request_id: RequestId) -> Option<&PendingRequest> {
        self.pending.get(&request_id)
    }

    /// Pending entries in ascending id order, for persistence and status
    pub fn pending_entries(&self) -> Vec<PendingRequest> {
        let mut entries: Vec<PendingRequest> = self.pending.values().copied().collect();
        entries.sort_by_key(|entry| entry.request_id);
        entries
    }
}

impl std::fmt::Debug for DecryptionBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionBroker")
            .field("pending", &self.pending.len())
            .finish()
    }
}
