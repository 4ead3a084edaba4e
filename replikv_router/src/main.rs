//! RepliKV router executable.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use replikv::{
    logger_init, pf_error, ReplikvError, RouterService, REPLICATION_FACTOR,
};
use tokio::runtime::Builder;
use tokio::sync::watch;

/// Command line arguments definition.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Address to listen at.
    #[arg(short, long, default_value = "127.0.0.1:52600")]
    addr: SocketAddr,

    /// List of node addresses served by this router.
    /// Example: '-n host1:port1 -n host2:port2 -n host3:port3'.
    #[arg(short, long)]
    nodes: Vec<SocketAddr>,

    /// Router configuration TOML string.
    /// Every '+' is treated as newline.
    #[arg(long, default_value_t = String::from(""))]
    config: String,

    /// Number of tokio worker threads.
    #[arg(long, default_value_t = 2)]
    threads: usize,
}

impl CliArgs {
    /// Sanitize command line arguments, return `Ok(())` on success or
    /// `Err(ReplikvError)` on any error.
    fn sanitize(&self) -> Result<(), ReplikvError> {
        // check for duplicate nodes
        let mut nodes_set = HashSet::new();
        for addr in self.nodes.iter() {
            if nodes_set.contains(addr) {
                return Err(ReplikvError::msg(format!(
                    "duplicate node address '{}' given",
                    addr
                )));
            }
            nodes_set.insert(addr);
        }

        if self.addr.port() <= 1024 {
            Err(ReplikvError::msg(format!(
                "invalid addr port {}",
                self.addr.port()
            )))
        } else if self.nodes.len() < REPLICATION_FACTOR {
            Err(ReplikvError::msg(format!(
                "too few nodes: {} given < {} needed",
                self.nodes.len(),
                REPLICATION_FACTOR
            )))
        } else if self.threads < 2 {
            Err(ReplikvError::msg(format!(
                "invalid number of threads {}",
                self.threads
            )))
        } else {
            Ok(())
        }
    }
}

/// Actual main function of the router executable.
fn router_main() -> Result<(), ReplikvError> {
    // read in and parse command line arguments
    let mut args = CliArgs::parse();
    args.sanitize()?;
    let nodes = std::mem::take(&mut args.nodes);

    // parse optional config string if given
    let config_str = if args.config.is_empty() {
        None
    } else {
        args.config = args.config.replace('+', "\n");
        Some(&args.config[..])
    };

    // set up termination signals handler
    let (tx_term, rx_term) = watch::channel(false);
    ctrlc::set_handler(move || {
        if let Err(e) = tx_term.send(true) {
            pf_error!("error sending to term channel: {}", e);
        }
    })
    .map_err(|e| ReplikvError::msg(e.to_string()))?;

    // create tokio multi-threaded runtime
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .worker_threads(args.threads)
        .thread_name("tokio-worker-router")
        .build()?;

    // enter tokio runtime, setup the router service, and start the main
    // event loop logic
    runtime.block_on(async move {
        let mut service =
            RouterService::new_and_setup(args.addr, nodes, config_str)
                .await?;

        service.run(rx_term).await?;

        Ok::<(), ReplikvError>(()) // give type hint for this async closure
    })
}

/// Main function of the router executable.
fn main() -> ExitCode {
    logger_init();

    if let Err(ref e) = router_main() {
        pf_error!("router_main exited: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
