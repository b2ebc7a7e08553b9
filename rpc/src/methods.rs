//! RPC Method Implementations
//!
//! Defines the JSON-RPC API using jsonrpsee macros.

use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::*;

/// CIPHERGRID RPC API trait
///
/// All methods are prefixed with `grid_` namespace.
#[rpc(server, namespace = "grid")]
pub trait GridApi {
    // =========== Registry Methods ===========

    /// Grant submission rights to an identity
    #[method(name = "authorize")]
    async fn authorize(&self, request: AuthorizeRequest) -> RpcResult<AuthorizeResponse>;

    /// Submit an encrypted observation
    #[method(name = "submitObservation")]
    async fn submit_observation(
        &self,
        request: SubmitObservationRequest,
    ) -> RpcResult<SubmitObservationResponse>;

    /// Get stored observation count
    #[method(name = "observationCount")]
    async fn observation_count(&self) -> RpcResult<u64>;

    // =========== Aggregation Methods ===========

    /// Start a grid rebuild over all stored observations
    #[method(name = "calculateDensityMap")]
    async fn calculate_density_map(
        &self,
        request: CalculateDensityMapRequest,
    ) -> RpcResult<RequestIdResponse>;

    /// Ask the oracle to decrypt the finished map
    #[method(name = "requestMapReveal")]
    async fn request_map_reveal(
        &self,
        request: RequestMapRevealRequest,
    ) -> RpcResult<RequestIdResponse>;

    /// Deliver a grid-build decryption result
    #[method(name = "gridBuildCallback")]
    async fn grid_build_callback(
        &self,
        request: DecryptionCallbackRequest,
    ) -> RpcResult<GridBuiltInfo>;

    /// Deliver a reveal decryption result
    #[method(name = "revealCallback")]
    async fn reveal_callback(
        &self,
        request: DecryptionCallbackRequest,
    ) -> RpcResult<MapRevealedInfo>;

    /// Check whether the grid has been built
    #[method(name = "isMapReady")]
    async fn is_map_ready(&self) -> RpcResult<bool>;

    // =========== Node Methods ===========

    /// Get node status
    #[method(name = "status")]
    async fn status(&self) -> RpcResult<StatusResponse>;

    /// Get API version
    #[method(name = "version")]
    async fn version(&self) -> RpcResult<String>;
}

/// Subscription API for real-time updates (WebSocket only)
#[rpc(server, namespace = "grid")]
pub trait GridSubscriptionApi {
    /// Subscribe to node events
    #[subscription(name = "subscribeEvents" => "event", item = EventInfo)]
    async fn subscribe_events(&self) -> jsonrpsee::core::SubscriptionResult;
}
