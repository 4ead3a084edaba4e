//! RepliKV frontend executable.

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use replikv::{logger_init, pf_error, FrontendApiService, ReplikvError};
use tokio::runtime::Builder;
use tokio::sync::watch;

/// Command line arguments definition.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Address to listen at for client connections.
    #[arg(short, long, default_value = "127.0.0.1:52500")]
    addr: SocketAddr,

    /// Address of the router service.
    #[arg(short, long, default_value = "127.0.0.1:52600")]
    router: SocketAddr,

    /// Frontend configuration TOML string.
    /// Every '+' is treated as newline.
    #[arg(long, default_value_t = String::from(""))]
    config: String,

    /// Number of tokio worker threads.
    #[arg(long, default_value_t = 4)]
    threads: usize,
}

impl CliArgs {
    /// Sanitize command line arguments, return `Ok(())` on success or
    /// `Err(ReplikvError)` on any error.
    fn sanitize(&self) -> Result<(), ReplikvError> {
        if self.addr.port() <= 1024 {
            Err(ReplikvError::msg(format!(
                "invalid addr port {}",
                self.addr.port()
            )))
        } else if self.router.port() <= 1024 {
            Err(ReplikvError::msg(format!(
                "invalid router port {}",
                self.router.port()
            )))
        } else if self.addr == self.router {
            Err(ReplikvError::msg(format!(
                "addr == router addr '{}'",
                self.addr
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

/// Actual main function of the frontend executable.
fn frontend_main() -> Result<(), ReplikvError> {
    // read in and parse command line arguments
    let mut args = CliArgs::parse();
    args.sanitize()?;

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
        .thread_name("tokio-worker-frontend")
        .build()?;

    // enter tokio runtime, setup the frontend service, and start the main
    // event loop logic
    runtime.block_on(async move {
        let mut service = FrontendApiService::new_and_setup(
            args.addr,
            args.router,
            config_str,
        )
        .await?;

        service.run(rx_term).await?;

        Ok::<(), ReplikvError>(()) // give type hint for this async closure
    })
}

/// Main function of the frontend executable.
fn main() -> ExitCode {
    logger_init();

    if let Err(ref e) = frontend_main() {
        pf_error!("frontend_main exited: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod arg_tests {
    use super::*;

    #[test]
    fn sanitize_valid() -> Result<(), ReplikvError> {
        let args = CliArgs {
            addr: "127.0.0.1:52500".parse()?,
            router: "127.0.0.1:52600".parse()?,
            config: "".into(),
            threads: 4,
        };
        assert!(args.sanitize().is_ok());
        Ok(())
    }

    #[test]
    fn sanitize_invalid_addr_port() -> Result<(), ReplikvError> {
        let args = CliArgs {
            addr: "127.0.0.1:80".parse()?,
            router: "127.0.0.1:52600".parse()?,
            config: "".into(),
            threads: 4,
        };
        assert!(args.sanitize().is_err());
        Ok(())
    }

    #[test]
    fn sanitize_same_addr_router() -> Result<(), ReplikvError> {
        let args = CliArgs {
            addr: "127.0.0.1:52600".parse()?,
            router: "127.0.0.1:52600".parse()?,
            config: "".into(),
            threads: 4,
        };
        assert!(args.sanitize().is_err());
        Ok(())
    }

    #[test]
    fn sanitize_invalid_threads() -> Result<(), ReplikvError> {
        let args = CliArgs {
            addr: "127.0.0.1:52500".parse()?,
            router: "127.0.0.1:52600".parse()?,
            config: "".into(),
            threads: 1,
        };
        assert!(args.sanitize().is_err());
        Ok(())
    }
}
