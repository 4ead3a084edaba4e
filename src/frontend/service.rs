//! Frontend TCP service: accepts client connections and runs their
//! commands through the quorum engine.

use std::sync::Arc;

use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::Duration;

use crate::client::{TcpNodeClient, TcpRouterClient};
use crate::frontend::Frontend;
use crate::messages::{ApiReply, ApiRequest, Command, CommandResult, ServiceAddr};
use crate::utils::{recv_msg, send_msg, tcp_bind_with_retry, ReplikvError};

/// Configuration parameters struct.
#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    /// Delay between roster fetch attempts in millisecs.
    pub init_timeout_ms: u64,
}

#[allow(clippy::derivable_impls)]
impl Default for FrontendConfig {
    fn default() -> Self {
        FrontendConfig {
            init_timeout_ms: 100,
        }
    }
}

/// Standalone frontend service over the TCP node and router clients.
pub struct FrontendApiService {
    /// Shared frontend core.
    frontend: Arc<Frontend<TcpNodeClient, TcpRouterClient>>,

    /// TCP listener for client connections.
    listener: TcpListener,
}

impl FrontendApiService {
    /// Creates a new frontend service listening on `addr`, asking `router`
    /// for replica sets.
    pub async fn new_and_setup(
        addr: ServiceAddr,
        router: ServiceAddr,
        config_str: Option<&str>,
    ) -> Result<Self, ReplikvError> {
        let config =
            parsed_config!(config_str => FrontendConfig; init_timeout_ms)?;
        if config.init_timeout_ms == 0 {
            return logged_err!(
                "invalid config.init_timeout_ms '{}'",
                config.init_timeout_ms
            );
        }

        let frontend = Frontend::new(
            router,
            Duration::from_millis(config.init_timeout_ms),
            TcpNodeClient::new(),
            TcpRouterClient::new(),
        );
        let listener = tcp_bind_with_retry(addr, 10).await?;

        Ok(FrontendApiService {
            frontend: Arc::new(frontend),
            listener,
        })
    }

    /// Main event loop of the frontend service. Breaks out of the loop
    /// only upon catching a termination signal to the process.
    pub async fn run(
        &mut self,
        mut rx_term: watch::Receiver<bool>,
    ) -> Result<(), ReplikvError> {
        loop {
            tokio::select! {
                // accepting a new client connection
                accepted = self.listener.accept() => {
                    let (conn, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            pf_warn!("error accepting connection: {}", e);
                            continue;
                        }
                    };
                    pf_info!("accepted new client '{}'", peer);
                    tokio::spawn(Self::client_servant(
                        self.frontend.clone(),
                        conn,
                        peer,
                    ));
                },

                // receiving termination signal
                _ = rx_term.changed() => {
                    pf_warn!("frontend caught termination signal");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Per-client servant task: runs each command through the quorum
    /// engine and replies with its decision.
    async fn client_servant(
        frontend: Arc<Frontend<TcpNodeClient, TcpRouterClient>>,
        mut conn: TcpStream,
        peer: ServiceAddr,
    ) {
        pf_debug!("client_servant for '{}' spawned", peer);

        loop {
            let req: ApiRequest = match recv_msg(&mut conn).await {
                Ok(req) => req,
                Err(_) => break, // client hung up
            };
            pf_trace!("request from '{}' req {:?}", peer, req);

            let result = match req.cmd {
                Command::Put { key, value } => {
                    CommandResult::Put(frontend.put(key, value).await)
                }
                Command::Get { key } => {
                    CommandResult::Get(frontend.get(key).await)
                }
                Command::Del { key } => {
                    CommandResult::Del(frontend.del(key).await)
                }
            };

            let reply = ApiReply { id: req.id, result };
            if let Err(e) = send_msg(&mut conn, &reply).await {
                pf_error!("error replying to '{}': {}", peer, e);
                break;
            }
        }

        pf_debug!("client_servant for '{}' exited", peer);
    }
}
