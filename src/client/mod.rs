//! RPC client abstractions consumed by the frontend and the node heartbeat
//! loop, plus their TCP implementations and the client-side frontend stub.

mod api;
mod node;
mod router;

pub use api::FrontendApiStub;
pub use node::TcpNodeClient;
pub use router::TcpRouterClient;

use async_trait::async_trait;

use crate::messages::{OpError, RecordId, ServiceAddr};

/// Client of the node record service. The quorum engine is generic over
/// this trait so tests can drive it with scripted replicas.
#[async_trait]
pub trait NodeClient: Send + Sync + 'static {
    /// Stores a record on the node. Fails with `RecordExists` if the key is
    /// occupied, or `NodeUnreachable` on transport failure.
    async fn put(
        &self,
        node: ServiceAddr,
        key: RecordId,
        value: Vec<u8>,
    ) -> Result<(), OpError>;

    /// Fetches a record from the node. Fails with `RecordNotFound` if the
    /// key is absent, or `NodeUnreachable` on transport failure.
    async fn get(
        &self,
        node: ServiceAddr,
        key: RecordId,
    ) -> Result<Vec<u8>, OpError>;

    /// Deletes a record from the node. Fails with `RecordNotFound` if the
    /// key is absent, or `NodeUnreachable` on transport failure.
    async fn del(&self, node: ServiceAddr, key: RecordId)
        -> Result<(), OpError>;
}

/// Client of the router service.
#[async_trait]
pub trait RouterClient: Send + Sync + 'static {
    /// Asks the router for the live replica set of `key`.
    async fn nodes_find(
        &self,
        router: ServiceAddr,
        key: RecordId,
    ) -> Result<Vec<ServiceAddr>, OpError>;

    /// Asks the router for its full static roster.
    async fn list(
        &self,
        router: ServiceAddr,
    ) -> Result<Vec<ServiceAddr>, OpError>;

    /// Reports `node` alive to the router.
    async fn heartbeat(
        &self,
        router: ServiceAddr,
        node: ServiceAddr,
    ) -> Result<(), OpError>;
}
