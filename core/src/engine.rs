//! Aggregation engine
//!
//! Exclusive owner of the registry and the grid; orchestrates them with
//! the broker to rebuild the density map from all observations and to
//! reveal the finished map once. All external access goes through the
//! engine (single-writer discipline): callers never hold the grid or
//! registry directly.
//!
//! A grid build is a point-in-time snapshot: the request batch covers
//! observations 1..count at request time, and anything submitted while
//! the oracle works is picked up by the next rebuild, not this one.

use crate::broker::DecryptionBroker;
use crate::grid::DensityGrid;
use crate::registry::{ObservationRegistry, ProviderSet};
use crate::types::{
    GridBuilt, MapRevealed, ObservationRecorded, PendingRequest, ProviderId, RequestKind,
};
use crate::{CoreError, CoreResult};
use ciphergrid_ahe::Ciphertext;
use ciphergrid_oracle::{DecryptionProof, OracleClient, ProofVerifier, RequestId};

/// Cleartext words per observation in a grid-build reply (x, y, z, density)
pub const OBSERVATION_FIELDS: usize = 4;

/// The aggregation state machine
pub struct AggregationEngine {
    registry: ObservationRegistry,
    grid: DensityGrid,
    broker: DecryptionBroker,
    /// Resolution the next grid-build callback will allocate; 0 = unset
    target_resolution: u32,
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregationEngine {
    /// Fresh engine with an empty provider set
    pub fn new() -> Self {
        Self::with_registry(ObservationRegistry::new(ProviderSet::new()))
    }

    /// Fresh engine over an injected registry
    pub fn with_registry(registry: ObservationRegistry) -> Self {
        Self {
            registry,
            grid: DensityGrid::new(),
            broker: DecryptionBroker::new(),
            target_resolution: 0,
        }
    }

    /// Rebuild from persisted state
    pub fn restore(
        registry: ObservationRegistry,
        grid: DensityGrid,
        broker: DecryptionBroker,
        target_resolution: u32,
    ) -> Self {
        Self {
            registry,
            grid,
            broker,
            target_resolution,
        }
    }

    /// Grant submission rights; idempotent, open to any caller
    pub fn authorize(&mut self, identity: ProviderId) -> bool {
        self.registry.authorize(identity)
    }

    /// Record an encrypted observation
    pub fn submit(
        &mut self,
        provider: ProviderId,
        encrypted_x: Ciphertext,
        encrypted_y: Ciphertext,
        encrypted_z: Ciphertext,
        encrypted_density: Ciphertext,
        now: u64,
    ) -> CoreResult<ObservationRecorded> {
        self.registry.submit(
            provider,
            encrypted_x,
            encrypted_y,
            encrypted_z,
            encrypted_density,
            now,
        )
    }

    pub fn observation_count(&self) -> u64 {
        self.registry.count()
    }

    /// Start a grid rebuild from all currently stored observations
    ///
    /// Lays out every observation's four fields consecutively in id
    /// order and submits the batch for decryption with kind GridBuild.
    /// Cells are not allocated here; that happens when the callback
    /// arrives. Fails with `InvalidResolution` before any state change.
    pub fn calculate_density_map(
        &mut self,
        resolution: u32,
        caller: ProviderId,
        client: &dyn OracleClient,
    ) -> CoreResult<RequestId> {
        DensityGrid::validate_resolution(resolution)?;

        let mut handles = Vec::with_capacity(self.registry.count() as usize * OBSERVATION_FIELDS);
        for obs in self.registry.observations() {
            handles.push(obs.encrypted_x.to_handle()?);
            handles.push(obs.encrypted_y.to_handle()?);
            handles.push(obs.encrypted_z.to_handle()?);
            handles.push(obs.encrypted_density.to_handle()?);
        }

        let request_id = self
            .broker
            .issue(client, handles, RequestKind::GridBuild, caller)?;
        self.target_resolution = resolution;
        Ok(request_id)
    }

    /// Grid-build callback: bin the decrypted observations
    ///
    /// Allocates a fresh grid at the stored target resolution and
    /// accumulates each (x, y, z, density) group, binning by modulus.
    /// The density re-enters the grid as a trivial ciphertext: binning
    /// requires the cleartext, so confidentiality does not extend
    /// across this boundary. Per-cell sums are order-independent.
    pub fn process_observations(
        &mut self,
        verifier: &dyn ProofVerifier,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &DecryptionProof,
    ) -> CoreResult<GridBuilt> {
        let resolved = self.broker.validate(
            verifier,
            request_id,
            cleartexts,
            proof,
            RequestKind::GridBuild,
        )?;

        if resolved.values.len() % OBSERVATION_FIELDS != 0 {
            return Err(CoreError::MalformedCleartexts {
                request_id,
                reason: format!(
                    "{} words do not divide into groups of {}",
                    resolved.values.len(),
                    OBSERVATION_FIELDS
                ),
            });
        }

        self.broker.consume(request_id)?;

        self.grid.allocate(self.target_resolution)?;
        for group in resolved.values.chunks_exact(OBSERVATION_FIELDS) {
            let (x, y, z, density) = (group[0], group[1], group[2], group[3]);
            self.grid.accumulate(x, y, z, &Ciphertext::trivial(density));
        }

        Ok(GridBuilt {
            request_id,
            initiator: resolved.initiator,
            resolution: self.grid.resolution(),
            observations: (resolved.values.len() / OBSERVATION_FIELDS) as u64,
        })
    }

    /// Ask the oracle to decrypt the finished grid
    ///
    /// Fails with `AlreadyRevealed` once a reveal has completed. An
    /// unbuilt grid flattens to an empty batch, which is permitted.
    pub fn request_map_reveal(
        &mut self,
        caller: ProviderId,
        client: &dyn OracleClient,
    ) -> CoreResult<RequestId> {
        if self.grid.is_revealed() {
            return Err(CoreError::AlreadyRevealed);
        }

        let handles = self.grid.flatten_for_reveal()?;
        self.broker
            .issue(client, handles, RequestKind::Reveal, caller)
    }

    /// Reveal callback: latch the revealed flag
    ///
    /// The decrypted values are returned to the caller and are not
    /// written back into the grid; cells keep their ciphertexts.
    /// Reveal callbacks are idempotent: every validly-proved callback
    /// for a still-pending reveal request succeeds and re-asserts the
    /// flag, so racing reveals issued before the flag flipped all
    /// complete.
    pub fn finalize_reveal(
        &mut self,
        verifier: &dyn ProofVerifier,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &DecryptionProof,
    ) -> CoreResult<MapRevealed> {
        let resolved = self.broker.validate(
            verifier,
            request_id,
            cleartexts,
            proof,
            RequestKind::Reveal,
        )?;

        self.broker.consume(request_id)?;
        self.grid.mark_revealed();

        Ok(MapRevealed {
            request_id,
            initiator: resolved.initiator,
            resolution: self.grid.resolution(),
            values: resolved.values,
        })
    }

    /// True once a grid build has populated cells
    pub fn is_map_ready(&self) -> bool {
        self.grid.is_populated()
    }

    pub fn registry(&self) -> &ObservationRegistry {
        &self.registry
    }

    pub fn grid(&self) -> &DensityGrid {
        &self.grid
    }

    pub fn broker(&self) -> &DecryptionBroker {
        &self.broker
    }

    pub fn target_resolution(&self) -> u32 {
        self.target_resolution
    }

    /// Pending requests in id order, for persistence
    pub fn pending_requests(&self) -> Vec<PendingRequest> {
        self.broker.pending_entries()
    }
}

impl std::fmt::Debug for AggregationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationEngine")
            .field("observations", &self.registry.count())
            .field("resolution", &self.grid.resolution())
            .field("revealed", &self.grid.is_revealed())
            .field("pending", &self.broker.pending_count())
            .finish()
    }
}
