//! Observation registry and provider authorization
//!
//! The registry appends encrypted observations under sequential ids and
//! gates submission on an explicit provider set. The set is injected at
//! construction so a persisted snapshot (or a test fixture) can supply
//! it; there is no hidden global.

use std::collections::{BTreeMap, HashSet};

use crate::types::{Observation, ObservationRecorded, ProviderId};
use crate::{CoreError, CoreResult};
use ciphergrid_ahe::Ciphertext;

/// Explicit provider authorization store
///
/// Grant-only: the source system models no revocation and neither does
/// this set.
#[derive(Clone, Debug, Default)]
pub struct ProviderSet {
    granted: HashSet<ProviderId>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted identities
    pub fn from_iter<I: IntoIterator<Item = ProviderId>>(identities: I) -> Self {
        Self {
            granted: identities.into_iter().collect(),
        }
    }

    /// Grant authorization; returns false if already granted
    pub fn grant(&mut self, identity: ProviderId) -> bool {
        self.granted.insert(identity)
    }

    pub fn is_authorized(&self, identity: &ProviderId) -> bool {
        self.granted.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.granted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderId> {
        self.granted.iter()
    }
}

/// Append-only store of submitted observations
#[derive(Clone, Debug)]
pub struct ObservationRegistry {
    providers: ProviderSet,
    /// Keyed by id; BTreeMap keeps iteration in ascending id order
    observations: BTreeMap<u64, Observation>,
}

impl ObservationRegistry {
    /// Create an empty registry over an injected provider set
    pub fn new(providers: ProviderSet) -> Self {
        Self {
            providers,
            observations: BTreeMap::new(),
        }
    }

    /// Rebuild from persisted state
    pub fn restore(providers: ProviderSet, observations: Vec<Observation>) -> Self {
        Self {
            providers,
            observations: observations.into_iter().map(|o| (o.id, o)).collect(),
        }
    }

    /// Grant submission rights to an identity; idempotent
    ///
    /// Note: callable by anyone, as in the source system. A hardened
    /// deployment gates this at the boundary that exposes it.
    pub fn authorize(&mut self, identity: ProviderId) -> bool {
        self.providers.grant(identity)
    }

    /// Store an encrypted observation under the next sequential id
    pub fn submit(
        &mut self,
        provider: ProviderId,
        encrypted_x: Ciphertext,
        encrypted_y: Ciphertext,
        encrypted_z: Ciphertext,
        encrypted_density: Ciphertext,
        now: u64,
    ) -> CoreResult<ObservationRecorded> {
        if !self.providers.is_authorized(&provider) {
            return Err(CoreError::Unauthorized(provider));
        }

        let id = self.count() + 1;
        self.observations.insert(
            id,
            Observation {
                id,
                provider,
                encrypted_x,
                encrypted_y,
                encrypted_z,
                encrypted_density,
                timestamp: now,
            },
        );

        Ok(ObservationRecorded { id, provider })
    }

    /// Number of stored observations (also the maximum valid id)
    pub fn count(&self) -> u64 {
        self.observations.len() as u64
    }

    pub fn get(&self, id: u64) -> Option<&Observation> {
        self.observations.get(&id)
    }

    /// Observations in ascending id order
    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.observations.values()
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }
}
