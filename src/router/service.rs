//! Router TCP service: accepts connections from nodes (heartbeats) and
//! frontends (replica-set queries) and serves them off the router core.

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::Duration;

use crate::messages::{RouterReply, RouterRequest, ServiceAddr};
use crate::router::{Router, RouterConfig};
use crate::utils::{recv_msg, send_msg, tcp_bind_with_retry, ReplikvError};

/// Standalone router service.
pub struct RouterService {
    /// Shared router core state.
    router: Arc<Router>,

    /// TCP listener for incoming connections.
    listener: TcpListener,
}

impl RouterService {
    /// Creates a new router service serving `nodes`, listening on `addr`.
    pub async fn new_and_setup(
        addr: ServiceAddr,
        nodes: Vec<ServiceAddr>,
        config_str: Option<&str>,
    ) -> Result<Self, ReplikvError> {
        let config = parsed_config!(config_str => RouterConfig;
                                    forget_timeout_ms)?;
        if config.forget_timeout_ms == 0 {
            return logged_err!(
                "invalid config.forget_timeout_ms '{}'",
                config.forget_timeout_ms
            );
        }

        let router = Router::new(
            nodes,
            Duration::from_millis(config.forget_timeout_ms),
        )?;
        let listener = tcp_bind_with_retry(addr, 10).await?;

        Ok(RouterService {
            router: Arc::new(router),
            listener,
        })
    }

    /// Main event loop of the router service. Breaks out of the loop only
    /// upon catching a termination signal to the process.
    pub async fn run(
        &mut self,
        mut rx_term: watch::Receiver<bool>,
    ) -> Result<(), ReplikvError> {
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
                        self.router.clone(),
                        conn,
                        peer,
                    ));
                },

                // receiving termination signal
                _ = rx_term.changed() => {
                    pf_warn!("router caught termination signal");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Per-connection servant task: serves requests off one connection
    /// until the peer hangs up.
    async fn conn_servant(
        router: Arc<Router>,
        mut conn: TcpStream,
        peer: ServiceAddr,
    ) {
        pf_debug!("conn_servant for '{}' spawned", peer);

        loop {
            let req: RouterRequest = match recv_msg(&mut conn).await {
                Ok(req) => req,
                Err(_) => break, // peer hung up
            };
            pf_trace!("request from '{}' req {:?}", peer, req);

            let reply = match req {
                RouterRequest::Heartbeat { node } => {
                    RouterReply::Heartbeat(router.heartbeat(node).await)
                }
                RouterRequest::NodesFind { key } => {
                    RouterReply::NodesFind(router.nodes_find(key).await)
                }
                RouterRequest::List => RouterReply::List(router.list()),
            };

            if let Err(e) = send_msg(&mut conn, &reply).await {
                pf_error!("error replying to '{}': {}", peer, e);
                break;
            }
        }

        pf_debug!("conn_servant for '{}' exited", peer);
    }
}
