//! Node TCP service: serves record requests and periodically heartbeats to
//! the router.

use std::sync::Arc;

use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::client::{RouterClient, TcpRouterClient};
use crate::messages::{NodeReply, NodeRequest, ServiceAddr};
use crate::node::RecordStore;
use crate::utils::{recv_msg, send_msg, tcp_bind_with_retry, ReplikvError};

/// Configuration parameters struct.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Time interval between two heartbeats in millisecs.
    pub heartbeat_ms: u64,
}

#[allow(clippy::derivable_impls)]
impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig { heartbeat_ms: 1000 }
    }
}

/// Standalone node service.
pub struct NodeService {
    /// My own address, as listed in the router's roster.
    addr: ServiceAddr,

    /// Address of the router service to heartbeat to.
    router: ServiceAddr,

    /// Configuration parameters struct.
    config: NodeConfig,

    /// Shared record map.
    store: Arc<RecordStore>,

    /// TCP listener for incoming record requests.
    listener: TcpListener,
}

impl NodeService {
    /// Creates a new node service listening on `addr`, heartbeating to
    /// `router`.
    pub async fn new_and_setup(
        addr: ServiceAddr,
        router: ServiceAddr,
        config_str: Option<&str>,
    ) -> Result<Self, ReplikvError> {
        let config = parsed_config!(config_str => NodeConfig; heartbeat_ms)?;
        if config.heartbeat_ms == 0 {
            return logged_err!(
                "invalid config.heartbeat_ms '{}'",
                config.heartbeat_ms
            );
        }

        let listener = tcp_bind_with_retry(addr, 10).await?;

        Ok(NodeService {
            addr,
            router,
            config,
            store: Arc::new(RecordStore::new()),
            listener,
        })
    }

    /// Main event loop of the node service. Spawns the heartbeat sender
    /// task, then accepts record connections until a termination signal is
    /// caught.
    pub async fn run(
        &mut self,
        mut rx_term: watch::Receiver<bool>,
    ) -> Result<(), ReplikvError> {
        tokio::spawn(Self::heartbeat_sender(
            self.addr,
            self.router,
            Duration::from_millis(self.config.heartbeat_ms),
            rx_term.clone(),
        ));

        loop {
            tokio::select! {
                // accepting a new connection
                accepted = self.listener.accept() => {
                    let (conn, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            pf_warn!("error accepting connection: {}", e);
                            continue;
                        }
                    };
                    tokio::spawn(Self::conn_servant(
                        self.store.clone(),
                        conn,
                        peer,
                    ));
                },

                // receiving termination signal
                _ = rx_term.changed() => {
                    pf_warn!("node caught termination signal");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Heartbeat sender task: reports this node alive to the router once
    /// per interval. A failed heartbeat is logged and retried at the next
    /// tick; the router will forget us if too many in a row are lost.
    async fn heartbeat_sender(
        addr: ServiceAddr,
        router: ServiceAddr,
        interval: Duration,
        mut rx_term: watch::Receiver<bool>,
    ) {
        pf_debug!("heartbeat_sender task spawned");

        let rc = TcpRouterClient::new();
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = rc.heartbeat(router, addr).await {
                        pf_warn!(
                            "error heartbeating to router '{}': {}",
                            router,
                            e
                        );
                    }
                },

                _ = rx_term.changed() => break,
            }
        }

        pf_debug!("heartbeat_sender task exited");
    }

    /// Per-connection servant task: serves record requests off one
    /// connection until the peer hangs up.
    async fn conn_servant(
        store: Arc<RecordStore>,
        mut conn: TcpStream,
        peer: ServiceAddr,
    ) {
        pf_debug!("conn_servant for '{}' spawned", peer);

        loop {
            let req: NodeRequest = match recv_msg(&mut conn).await {
                Ok(req) => req,
                Err(_) => break, // peer hung up
            };
            pf_trace!("request from '{}' req {:?}", peer, req);

            let reply = match req {
                NodeRequest::Put { key, value } => {
                    NodeReply::Put(store.put(key, value).await)
                }
                NodeRequest::Get { key } => NodeReply::Get(store.get(key).await),
                NodeRequest::Del { key } => NodeReply::Del(store.del(key).await),
            };

            if let Err(e) = send_msg(&mut conn, &reply).await {
                pf_error!("error replying to '{}': {}", peer, e);
                break;
            }
        }

        pf_debug!("conn_servant for '{}' exited", peer);
    }
}

#[cfg(test)]
mod service_tests {
    use super::*;
    use crate::client::{NodeClient, TcpNodeClient};
    use crate::messages::OpError;
    use crate::router::RouterService;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn serve_records_over_tcp() -> Result<(), ReplikvError> {
        let addr: ServiceAddr = "127.0.0.1:54810".parse()?;
        // no router is listening there; heartbeats just log warnings
        let router: ServiceAddr = "127.0.0.1:54811".parse()?;

        let mut service =
            NodeService::new_and_setup(addr, router, None).await?;
        let (_tx_term, rx_term) = watch::channel(false);
        tokio::spawn(async move { service.run(rx_term).await });
        time::sleep(Duration::from_millis(50)).await;

        let nc = TcpNodeClient::new();
        assert_eq!(nc.put(addr, 7, b"hi".to_vec()).await, Ok(()));
        assert_eq!(
            nc.put(addr, 7, b"again".to_vec()).await,
            Err(OpError::RecordExists)
        );
        assert_eq!(nc.get(addr, 7).await, Ok(b"hi".to_vec()));
        assert_eq!(nc.del(addr, 7).await, Ok(()));
        assert_eq!(nc.get(addr, 7).await, Err(OpError::RecordNotFound));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn heartbeats_keep_node_alive() -> Result<(), ReplikvError> {
        let router_addr: ServiceAddr = "127.0.0.1:54815".parse()?;
        let roster: Vec<ServiceAddr> = vec![
            "127.0.0.1:54816".parse()?,
            "127.0.0.1:54817".parse()?,
            "127.0.0.1:54818".parse()?,
        ];

        let mut router_service = RouterService::new_and_setup(
            router_addr,
            roster.clone(),
            Some("forget_timeout_ms = 300"),
        )
        .await?;
        let (_tx_term, rx_term) = watch::channel(false);
        tokio::spawn(async move { router_service.run(rx_term).await });

        // only two of the three roster nodes actually run
        let mut term_txs = vec![];
        for &addr in &roster[..2] {
            let mut node_service = NodeService::new_and_setup(
                addr,
                router_addr,
                Some("heartbeat_ms = 50"),
            )
            .await?;
            let (tx, rx) = watch::channel(false);
            term_txs.push(tx);
            tokio::spawn(async move { node_service.run(rx).await });
        }

        // wait past the forget timeout: the silent node must be filtered
        // while the heartbeating ones stay live
        time::sleep(Duration::from_millis(500)).await;

        let rc = TcpRouterClient::new();
        let found = rc.nodes_find(router_addr, 7).await?;
        assert_eq!(found.len(), 2);
        assert!(!found.contains(&roster[2]));
        Ok(())
    }
}
