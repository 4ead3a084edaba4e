//! TCP implementation of the router service client.

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::client::RouterClient;
use crate::messages::{
    OpError, RecordId, RouterReply, RouterRequest, ServiceAddr,
};
use crate::utils::{recv_msg, send_msg};

/// Router service client doing one short-lived connection per call.
#[derive(Debug, Default, Clone)]
pub struct TcpRouterClient;

impl TcpRouterClient {
    /// Creates a new router service client.
    pub fn new() -> Self {
        TcpRouterClient
    }

    /// Connects to `router`, sends `req`, and reads back a single reply.
    async fn call(
        &self,
        router: ServiceAddr,
        req: &RouterRequest,
    ) -> Result<RouterReply, OpError> {
        let mut conn = TcpStream::connect(router).await.map_err(|e| {
            pf_debug!("connecting to router '{}' failed: {}", router, e);
            OpError::RouterUnreachable
        })?;

        send_msg(&mut conn, req).await.map_err(|e| {
            pf_debug!("sending request to router '{}' failed: {}", router, e);
            OpError::RouterUnreachable
        })?;
        recv_msg(&mut conn).await.map_err(|e| {
            pf_debug!("receiving reply from router '{}' failed: {}", router, e);
            OpError::RouterUnreachable
        })
    }
}

#[async_trait]
impl RouterClient for TcpRouterClient {
    async fn nodes_find(
        &self,
        router: ServiceAddr,
        key: RecordId,
    ) -> Result<Vec<ServiceAddr>, OpError> {
        match self.call(router, &RouterRequest::NodesFind { key }).await? {
            RouterReply::NodesFind(result) => result,
            reply => {
                pf_error!(
                    "unexpected reply to NodesFind from '{}': {:?}",
                    router,
                    reply
                );
                Err(OpError::RouterUnreachable)
            }
        }
    }

    async fn list(
        &self,
        router: ServiceAddr,
    ) -> Result<Vec<ServiceAddr>, OpError> {
        match self.call(router, &RouterRequest::List).await? {
            RouterReply::List(roster) => Ok(roster),
            reply => {
                pf_error!(
                    "unexpected reply to List from '{}': {:?}",
                    router,
                    reply
                );
                Err(OpError::RouterUnreachable)
            }
        }
    }

    async fn heartbeat(
        &self,
        router: ServiceAddr,
        node: ServiceAddr,
    ) -> Result<(), OpError> {
        match self.call(router, &RouterRequest::Heartbeat { node }).await? {
            RouterReply::Heartbeat(result) => result,
            reply => {
                pf_error!(
                    "unexpected reply to Heartbeat from '{}': {:?}",
                    router,
                    reply
                );
                Err(OpError::RouterUnreachable)
            }
        }
    }
}
