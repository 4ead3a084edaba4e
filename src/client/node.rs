//! TCP implementation of the node service client.

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::client::NodeClient;
use crate::messages::{NodeReply, NodeRequest, OpError, RecordId, ServiceAddr};
use crate::utils::{recv_msg, send_msg};

/// Node service client doing one short-lived connection per call. Any
/// transport-level failure is reported as the canonical `NodeUnreachable`
/// kind so that flaky replicas tally separately from logical errors.
#[derive(Debug, Default, Clone)]
pub struct TcpNodeClient;

impl TcpNodeClient {
    /// Creates a new node service client.
    pub fn new() -> Self {
        TcpNodeClient
    }

    /// Connects to `node`, sends `req`, and reads back a single reply.
    async fn call(
        &self,
        node: ServiceAddr,
        req: &NodeRequest,
    ) -> Result<NodeReply, OpError> {
        let mut conn = TcpStream::connect(node).await.map_err(|e| {
            pf_debug!("connecting to node '{}' failed: {}", node, e);
            OpError::NodeUnreachable
        })?;

        send_msg(&mut conn, req).await.map_err(|e| {
            pf_debug!("sending request to node '{}' failed: {}", node, e);
            OpError::NodeUnreachable
        })?;
        recv_msg(&mut conn).await.map_err(|e| {
            pf_debug!("receiving reply from node '{}' failed: {}", node, e);
            OpError::NodeUnreachable
        })
    }
}

#[async_trait]
impl NodeClient for TcpNodeClient {
    async fn put(
        &self,
        node: ServiceAddr,
        key: RecordId,
        value: Vec<u8>,
    ) -> Result<(), OpError> {
        match self.call(node, &NodeRequest::Put { key, value }).await? {
            NodeReply::Put(result) => result,
            reply => {
                pf_error!("unexpected reply to Put from '{}': {:?}", node, reply);
                Err(OpError::NodeUnreachable)
            }
        }
    }

    async fn get(
        &self,
        node: ServiceAddr,
        key: RecordId,
    ) -> Result<Vec<u8>, OpError> {
        match self.call(node, &NodeRequest::Get { key }).await? {
            NodeReply::Get(result) => result,
            reply => {
                pf_error!("unexpected reply to Get from '{}': {:?}", node, reply);
                Err(OpError::NodeUnreachable)
            }
        }
    }

    async fn del(
        &self,
        node: ServiceAddr,
        key: RecordId,
    ) -> Result<(), OpError> {
        match self.call(node, &NodeRequest::Del { key }).await? {
            NodeReply::Del(result) => result,
            reply => {
                pf_error!("unexpected reply to Del from '{}': {:?}", node, reply);
                Err(OpError::NodeUnreachable)
            }
        }
    }
}
