//! RPC Server Implementation

use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult, SubscriptionResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::{PendingSubscriptionSink, SubscriptionMessage};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use ciphergrid_ahe::{Ciphertext, CiphertextHandle};
use ciphergrid_core::ProviderId;
use ciphergrid_node::GridNode;
use ciphergrid_oracle::{DecryptionProof, RequestId};

use crate::errors::{RpcError, RpcErrorCode};
use crate::methods::{GridApiServer, GridSubscriptionApiServer};
use crate::types::*;
use crate::RPC_VERSION;

/// RPC server configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// HTTP/WebSocket bind address
    pub http_addr: SocketAddr,
    /// Maximum request size in bytes
    pub max_request_size: u32,
    /// Maximum response size in bytes
    pub max_response_size: u32,
    /// Maximum concurrent connections
    pub max_connections: u32,
    /// Enable CORS
    pub cors_enabled: bool,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Require a token for grid_authorize
    pub require_admin_auth: bool,
    /// Admin token (if auth required)
    pub admin_token: Option<String>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8545".parse().expect("valid bind address"),
            max_request_size: 10 * 1024 * 1024, // 10MB
            max_response_size: 10 * 1024 * 1024,
            max_connections: 100,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            require_admin_auth: false,
            admin_token: None,
        }
    }
}

impl RpcConfig {
    /// Create config for local development
    pub fn local() -> Self {
        Self::default()
    }
}

/// Node context shared with RPC handlers
pub struct GridContext {
    /// The node every handler goes through
    pub node: Arc<GridNode>,
}

/// The RPC server
pub struct RpcServer {
    config: RpcConfig,
    context: Arc<GridContext>,
    handle: Option<ServerHandle>,
}

impl RpcServer {
    /// Create a new RPC server
    pub fn new(config: RpcConfig, context: GridContext) -> Self {
        Self {
            config,
            context: Arc::new(context),
            handle: None,
        }
    }

    /// Start the HTTP/WebSocket RPC server
    pub async fn start(&mut self) -> Result<(), RpcError> {
        let server = Server::builder()
            .max_request_body_size(self.config.max_request_size)
            .max_response_body_size(self.config.max_response_size)
            .max_connections(self.config.max_connections)
            .build(self.config.http_addr)
            .await
            .map_err(|e| RpcError::ServerError(e.to_string()))?;

        let handler = ApiHandler {
            context: self.context.clone(),
            config: self.config.clone(),
        };

        let mut module = jsonrpsee::RpcModule::new(());
        if let Err(e) = module.merge(GridApiServer::into_rpc(handler.clone())) {
            error!("Failed to merge GridApi: {}", e);
        }
        if let Err(e) = module.merge(GridSubscriptionApiServer::into_rpc(handler)) {
            error!("Failed to merge GridSubscriptionApi: {}", e);
        }

        info!("Starting RPC server on {}", self.config.http_addr);

        let handle = server.start(module);
        self.handle = Some(handle);

        Ok(())
    }

    /// Stop the RPC server
    pub async fn stop(&mut self) -> Result<(), RpcError> {
        if let Some(handle) = self.handle.take() {
            info!("Stopping RPC server");
            handle
                .stop()
                .map_err(|e| RpcError::ServerError(format!("{:?}", e)))?;
        }
        Ok(())
    }

    /// Get the server address
    pub fn addr(&self) -> SocketAddr {
        self.config.http_addr
    }
}

/// API handler implementing the RPC traits
#[derive(Clone)]
struct ApiHandler {
    context: Arc<GridContext>,
    config: RpcConfig,
}

impl ApiHandler {
    fn hex_decode(s: &str) -> Result<Vec<u8>, ErrorObjectOwned> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(s).map_err(|e| invalid_params(format!("Invalid hex: {}", e)))
    }

    fn provider(s: &str) -> Result<ProviderId, ErrorObjectOwned> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        ProviderId::from_hex(s).map_err(|e| invalid_params(e.to_string()))
    }

    fn ciphertext(s: &str) -> Result<Ciphertext, ErrorObjectOwned> {
        let bytes = Self::hex_decode(s)?;
        let handle = CiphertextHandle::from_bytes(bytes);
        Ciphertext::from_handle(&handle).map_err(|e| invalid_params(e.to_string()))
    }

    fn proof(s: &str) -> Result<DecryptionProof, ErrorObjectOwned> {
        let bytes = Self::hex_decode(s)?;
        DecryptionProof::from_bytes(&bytes).map_err(|e| invalid_params(e.to_string()))
    }

    fn check_admin(&self, token: Option<&str>) -> Result<(), ErrorObjectOwned> {
        if !self.config.require_admin_auth {
            return Ok(());
        }
        match (&self.config.admin_token, token) {
            (Some(expected), Some(given)) if expected == given => Ok(()),
            _ => Err(RpcError::AdminRequired.into()),
        }
    }
}

fn invalid_params(message: String) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(RpcErrorCode::InvalidParams.code(), message, None::<()>)
}

fn node_error(err: ciphergrid_node::NodeError) -> ErrorObjectOwned {
    RpcError::from(err).into()
}

#[async_trait]
impl GridApiServer for ApiHandler {
    async fn authorize(&self, request: AuthorizeRequest) -> RpcResult<AuthorizeResponse> {
        self.check_admin(request.admin_token.as_deref())?;
        let identity = Self::provider(&request.identity)?;

        let newly_granted = self
            .context
            .node
            .authorize(identity)
            .await
            .map_err(node_error)?;

        Ok(AuthorizeResponse {
            identity: identity.to_hex(),
            newly_granted,
        })
    }

    async fn submit_observation(
        &self,
        request: SubmitObservationRequest,
    ) -> RpcResult<SubmitObservationResponse> {
        let provider = Self::provider(&request.provider)?;
        let x = Self::ciphertext(&request.x)?;
        let y = Self::ciphertext(&request.y)?;
        let z = Self::ciphertext(&request.z)?;
        let density = Self::ciphertext(&request.density)?;

        let recorded = self
            .context
            .node
            .submit_observation(provider, x, y, z, density)
            .await
            .map_err(node_error)?;

        debug!("RPC stored observation {}", recorded.id);
        Ok(SubmitObservationResponse {
            id: recorded.id,
            provider: recorded.provider.to_hex(),
        })
    }

    async fn observation_count(&self) -> RpcResult<u64> {
        Ok(self.context.node.observation_count().await)
    }

    async fn calculate_density_map(
        &self,
        request: CalculateDensityMapRequest,
    ) -> RpcResult<RequestIdResponse> {
        let caller = Self::provider(&request.caller)?;

        let request_id = self
            .context
            .node
            .calculate_density_map(request.resolution, caller)
            .await
            .map_err(node_error)?;

        Ok(RequestIdResponse {
            request_id: request_id.value(),
        })
    }

    async fn request_map_reveal(
        &self,
        request: RequestMapRevealRequest,
    ) -> RpcResult<RequestIdResponse> {
        let caller = Self::provider(&request.caller)?;

        let request_id = self
            .context
            .node
            .request_map_reveal(caller)
            .await
            .map_err(node_error)?;

        Ok(RequestIdResponse {
            request_id: request_id.value(),
        })
    }

    async fn grid_build_callback(
        &self,
        request: DecryptionCallbackRequest,
    ) -> RpcResult<GridBuiltInfo> {
        let cleartexts = Self::hex_decode(&request.cleartexts)?;
        let proof = Self::proof(&request.proof)?;

        let built = self
            .context
            .node
            .grid_build_callback(RequestId::new(request.request_id), &cleartexts, &proof)
            .await
            .map_err(node_error)?;

        Ok(GridBuiltInfo {
            request_id: built.request_id.value(),
            resolution: built.resolution,
            observations: built.observations,
        })
    }

    async fn reveal_callback(
        &self,
        request: DecryptionCallbackRequest,
    ) -> RpcResult<MapRevealedInfo> {
        let cleartexts = Self::hex_decode(&request.cleartexts)?;
        let proof = Self::proof(&request.proof)?;

        let revealed = self
            .context
            .node
            .reveal_callback(RequestId::new(request.request_id), &cleartexts, &proof)
            .await
            .map_err(node_error)?;

        Ok(MapRevealedInfo {
            request_id: revealed.request_id.value(),
            resolution: revealed.resolution,
            values: revealed.values,
        })
    }

    async fn is_map_ready(&self) -> RpcResult<bool> {
        Ok(self.context.node.is_map_ready().await)
    }

    async fn status(&self) -> RpcResult<StatusResponse> {
        let status = self.context.node.status().await;

        Ok(StatusResponse {
            version: RPC_VERSION.to_string(),
            network: status.network,
            running: status.running,
            observation_count: status.observation_count,
            provider_count: status.provider_count,
            resolution: status.resolution,
            target_resolution: status.target_resolution,
            map_ready: status.map_ready,
            revealed: status.revealed,
            pending_requests: status.pending_requests,
            oracle_queue: status.oracle_queue,
        })
    }

    async fn version(&self) -> RpcResult<String> {
        Ok(RPC_VERSION.to_string())
    }
}

#[async_trait]
impl GridSubscriptionApiServer for ApiHandler {
    async fn subscribe_events(&self, pending: PendingSubscriptionSink) -> SubscriptionResult {
        let mut events = self.context.node.subscribe();
        let sink = pending.accept().await?;

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let info = EventInfo::from(event);
                        let msg = match SubscriptionMessage::from_json(&info) {
                            Ok(msg) => msg,
                            Err(_) => break,
                        };
                        if sink.send(msg).await.is_err() {
                            break;
                        }
                    }
                    // Dropped events are acceptable for lagging readers
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(())
    }
}
