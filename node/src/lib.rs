//! CIPHERGRID Node Implementation
//!
//! A full aggregation node: the in-memory engine, durable storage, the
//! local decryption oracle, and an event bus, glued into one service.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      CIPHERGRID Node                       │
//! ├────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐    │
//! │  │  Aggregation │   │   Storage    │   │  Event Bus   │    │
//! │  │    Engine    │──▶│   (redb)     │   │ (broadcast)  │    │
//! │  └──────────────┘   └──────────────┘   └──────────────┘    │
//! │         │                                                  │
//! │  ┌──────▼───────────────────────────────────────────┐      │
//! │  │              Oracle Pump Loop                    │      │
//! │  │  submit batches ──▶ LocalOracle ──▶ callbacks    │      │
//! │  └──────────────────────────────────────────────────┘      │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Operation Pipeline
//!
//! 1. **Mutate**: the engine applies the operation or rejects it whole
//! 2. **Persist**: the change is written through to redb
//! 3. **Announce**: a [`NodeEvent`] goes out on the broadcast channel
//!
//! On startup the node replays storage into a fresh engine, so a
//! restart resumes mid-protocol: stored observations, the built grid,
//! the revealed flag, and still-pending decryption requests all
//! survive. The mask key of the bundled [`LocalOracle`] does not;
//! observation ciphertexts from an earlier process can only be
//! decrypted by the committee that existed when they were made.

mod error;
mod events;

pub use error::{NodeError, NodeResult};
pub use events::NodeEvent;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use ciphergrid_ahe::Ciphertext;
use ciphergrid_core::{
    AggregationEngine, DecryptionBroker, DensityGrid, GridBuilt, MapRevealed, ObservationRecorded,
    ObservationRegistry, ProviderId, ProviderSet, RequestKind,
};
use ciphergrid_oracle::{
    CommitteeVerifier, DecryptionCallback, DecryptionProof, LocalOracle, OracleConfig, RequestId,
};
use ciphergrid_storage::{GridMeta, Storage};

/// Node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,
    /// Network identifier
    pub network: String,
    /// Oracle committee configuration
    pub oracle: OracleConfig,
    /// Sleep between oracle polls when the queue is empty
    pub poll_interval: Duration,
    /// Event channel capacity
    pub event_buffer: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./ciphergrid-data"),
            network: "local".to_string(),
            oracle: OracleConfig::default(),
            poll_interval: Duration::from_millis(100),
            event_buffer: 256,
        }
    }
}

impl NodeConfig {
    /// Create local development configuration
    pub fn local() -> Self {
        Self::default()
    }
}

/// The CIPHERGRID node
pub struct GridNode {
    config: NodeConfig,
    engine: Arc<RwLock<AggregationEngine>>,
    storage: Arc<Storage>,
    oracle: Arc<LocalOracle>,
    verifier: CommitteeVerifier,
    events: broadcast::Sender<NodeEvent>,
    running: Arc<RwLock<bool>>,
}

impl GridNode {
    /// Create a new node from configuration
    ///
    /// Opens (or creates) storage under the data directory and replays
    /// it into a fresh engine.
    pub async fn new(config: NodeConfig) -> NodeResult<Self> {
        info!("Initializing CIPHERGRID node for network: {}", config.network);

        std::fs::create_dir_all(&config.data_dir)?;
        let storage = Storage::open(config.data_dir.join("grid.db"))?;

        // Replay persisted state
        let providers = ProviderSet::from_iter(storage.providers.all()?);
        let observations = storage.observations.all()?;
        let registry = ObservationRegistry::restore(providers, observations);

        let (grid, target_resolution) = match storage.grid.load()? {
            Some((meta, cells)) => (
                DensityGrid::restore(meta.resolution, meta.revealed, cells),
                meta.target_resolution,
            ),
            None => (DensityGrid::new(), 0),
        };
        let broker = DecryptionBroker::restore(storage.requests.all()?);
        let engine = AggregationEngine::restore(registry, grid, broker, target_resolution);

        info!(
            "Hydrated {} observations, {} pending requests, resolution {}",
            engine.observation_count(),
            engine.broker().pending_count(),
            engine.grid().resolution()
        );

        let oracle = LocalOracle::new(&config.oracle)?;
        let verifier = oracle.verifier();
        let (events, _) = broadcast::channel(config.event_buffer);

        Ok(Self {
            config,
            engine: Arc::new(RwLock::new(engine)),
            storage: Arc::new(storage),
            oracle: Arc::new(oracle),
            verifier,
            events,
            running: Arc::new(RwLock::new(false)),
        })
    }

    /// Grant submission rights to an identity; idempotent
    pub async fn authorize(&self, identity: ProviderId) -> NodeResult<bool> {
        let newly_granted = self.engine.write().await.authorize(identity);
        if newly_granted {
            self.storage.providers.grant(&identity)?;
            debug!("Authorized provider {}", identity);
            let _ = self.events.send(NodeEvent::ProviderAuthorized { identity });
        }
        Ok(newly_granted)
    }

    /// Record an encrypted observation
    pub async fn submit_observation(
        &self,
        provider: ProviderId,
        encrypted_x: Ciphertext,
        encrypted_y: Ciphertext,
        encrypted_z: Ciphertext,
        encrypted_density: Ciphertext,
    ) -> NodeResult<ObservationRecorded> {
        let now = unix_now();

        let mut engine = self.engine.write().await;
        let recorded = engine.submit(
            provider,
            encrypted_x,
            encrypted_y,
            encrypted_z,
            encrypted_density,
            now,
        )?;
        let observation = engine
            .registry()
            .get(recorded.id)
            .cloned()
            .ok_or_else(|| NodeError::State("observation missing after submit".into()))?;
        self.storage.observations.put(&observation)?;
        drop(engine);

        debug!("Stored observation {} from {}", recorded.id, recorded.provider);
        let _ = self.events.send(NodeEvent::ObservationStored(recorded));
        Ok(recorded)
    }

    /// Start a grid rebuild over all stored observations
    pub async fn calculate_density_map(
        &self,
        resolution: u32,
        caller: ProviderId,
    ) -> NodeResult<RequestId> {
        let mut engine = self.engine.write().await;
        let request_id = engine.calculate_density_map(resolution, caller, self.oracle.as_ref())?;
        let entry = engine
            .broker()
            .get(request_id)
            .copied()
            .ok_or_else(|| NodeError::State("pending request missing after issue".into()))?;
        let observations = engine.observation_count();

        self.storage.requests.put(&entry)?;
        self.storage.grid.save_meta(&grid_meta_of(&engine))?;
        drop(engine);

        info!(
            "Grid build {} requested: resolution {}, {} observations",
            request_id, resolution, observations
        );
        let _ = self.events.send(NodeEvent::GridBuildRequested {
            request_id,
            resolution,
            observations,
        });
        Ok(request_id)
    }

    /// Grid-build callback from the oracle
    pub async fn grid_build_callback(
        &self,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &DecryptionProof,
    ) -> NodeResult<GridBuilt> {
        let mut engine = self.engine.write().await;
        let built = engine.process_observations(&self.verifier, request_id, cleartexts, proof)?;

        self.storage.requests.remove(request_id)?;
        self.storage
            .grid
            .save(&grid_meta_of(&engine), engine.grid().cells())?;
        drop(engine);

        info!(
            "Grid built: resolution {}, {} observations binned",
            built.resolution, built.observations
        );
        let _ = self.events.send(NodeEvent::GridBuilt(built));
        Ok(built)
    }

    /// Ask the oracle to decrypt the finished map
    pub async fn request_map_reveal(&self, caller: ProviderId) -> NodeResult<RequestId> {
        let mut engine = self.engine.write().await;
        let request_id = engine.request_map_reveal(caller, self.oracle.as_ref())?;
        let entry = engine
            .broker()
            .get(request_id)
            .copied()
            .ok_or_else(|| NodeError::State("pending request missing after issue".into()))?;

        self.storage.requests.put(&entry)?;
        drop(engine);

        info!("Map reveal {} requested", request_id);
        let _ = self
            .events
            .send(NodeEvent::MapRevealRequested { request_id });
        Ok(request_id)
    }

    /// Reveal callback from the oracle
    pub async fn reveal_callback(
        &self,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &DecryptionProof,
    ) -> NodeResult<MapRevealed> {
        let mut engine = self.engine.write().await;
        let revealed = engine.finalize_reveal(&self.verifier, request_id, cleartexts, proof)?;

        self.storage.requests.remove(request_id)?;
        self.storage.grid.save_meta(&grid_meta_of(&engine))?;
        drop(engine);

        info!("Density map revealed at resolution {}", revealed.resolution);
        let _ = self.events.send(NodeEvent::MapRevealed(revealed.clone()));
        Ok(revealed)
    }

    /// Answer one queued oracle batch and route the callback
    ///
    /// Returns whether a batch was processed. The bundled oracle pops
    /// the batch before answering, so a failing callback is logged by
    /// [`run`](Self::run) rather than retried.
    pub async fn pump_oracle_once(&self) -> NodeResult<bool> {
        let callback = match self.oracle.respond_next()? {
            Some(callback) => callback,
            None => return Ok(false),
        };
        self.dispatch_callback(callback).await?;
        Ok(true)
    }

    async fn dispatch_callback(&self, callback: DecryptionCallback) -> NodeResult<()> {
        let kind = {
            let engine = self.engine.read().await;
            engine
                .broker()
                .get(callback.request_id)
                .map(|entry| entry.kind)
        };

        match kind {
            Some(RequestKind::GridBuild) => {
                self.grid_build_callback(
                    callback.request_id,
                    &callback.cleartexts,
                    &callback.proof,
                )
                .await?;
            }
            Some(RequestKind::Reveal) => {
                self.reveal_callback(callback.request_id, &callback.cleartexts, &callback.proof)
                    .await?;
            }
            None => {
                return Err(NodeError::State(format!(
                    "oracle answered unknown request {}",
                    callback.request_id
                )));
            }
        }
        Ok(())
    }

    /// Start the node
    pub async fn start(&self) -> NodeResult<()> {
        info!("Starting CIPHERGRID node");
        *self.running.write().await = true;
        Ok(())
    }

    /// Run the oracle pump loop until stopped
    pub async fn run(&self) -> NodeResult<()> {
        info!("Entering oracle pump loop");

        while *self.running.read().await {
            match self.pump_oracle_once().await {
                Ok(true) => {}
                Ok(false) => tokio::time::sleep(self.config.poll_interval).await,
                Err(e) => {
                    warn!("Oracle callback failed: {}", e);
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }

        info!("Oracle pump loop exiting");
        Ok(())
    }

    /// Stop the node
    pub async fn stop(&self) {
        info!("Stopping CIPHERGRID node");
        *self.running.write().await = false;
    }

    /// Check if node is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// True once a grid build has populated cells
    pub async fn is_map_ready(&self) -> bool {
        self.engine.read().await.is_map_ready()
    }

    /// Number of stored observations
    pub async fn observation_count(&self) -> u64 {
        self.engine.read().await.observation_count()
    }

    /// Point-in-time status snapshot
    pub async fn status(&self) -> NodeStatus {
        let engine = self.engine.read().await;
        NodeStatus {
            network: self.config.network.clone(),
            running: *self.running.read().await,
            observation_count: engine.observation_count(),
            provider_count: engine.registry().providers().len(),
            resolution: engine.grid().resolution(),
            target_resolution: engine.target_resolution(),
            map_ready: engine.is_map_ready(),
            revealed: engine.grid().is_revealed(),
            pending_requests: engine.broker().pending_count(),
            oracle_queue: self.oracle.pending_count(),
        }
    }

    /// Subscribe to node events
    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }

    /// Get node configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Get engine reference
    pub fn engine(&self) -> Arc<RwLock<AggregationEngine>> {
        self.engine.clone()
    }

    /// Get storage reference
    pub fn storage(&self) -> Arc<Storage> {
        self.storage.clone()
    }

    /// Get oracle reference
    pub fn oracle(&self) -> Arc<LocalOracle> {
        self.oracle.clone()
    }

    /// Get the proof verifier for this node's committee
    pub fn verifier(&self) -> &CommitteeVerifier {
        &self.verifier
    }
}

/// Point-in-time node status
#[derive(Debug, Clone)]
pub struct NodeStatus {
    pub network: String,
    pub running: bool,
    pub observation_count: u64,
    pub provider_count: usize,
    pub resolution: u32,
    pub target_resolution: u32,
    pub map_ready: bool,
    pub revealed: bool,
    pub pending_requests: usize,
    pub oracle_queue: usize,
}

fn grid_meta_of(engine: &AggregationEngine) -> GridMeta {
    GridMeta {
        resolution: engine.grid().resolution(),
        revealed: engine.grid().is_revealed(),
        target_resolution: engine.target_resolution(),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
