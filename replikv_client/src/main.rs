//! RepliKV command-line client utility: issues one command against a
//! frontend and prints the outcome.

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use replikv::{
    logger_init, pf_error, Command, CommandResult, FrontendApiStub, RecordId,
    ReplikvError,
};
use tokio::runtime::Builder;

/// Client operation to run.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum ClientOp {
    Put,
    Get,
    Del,
}

impl ClientOp {
    /// Parse operation name string into a `ClientOp` variant.
    fn parse_name(name: &str) -> Option<Self> {
        match &name.to_lowercase()[..] {
            "put" => Some(Self::Put),
            "get" => Some(Self::Get),
            "del" => Some(Self::Del),
            _ => None,
        }
    }
}

/// Command line arguments definition.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Address of the frontend service.
    #[arg(short, long, default_value = "127.0.0.1:52500")]
    frontend: SocketAddr,

    /// Operation to run: put|get|del.
    #[arg(short, long)]
    op: String,

    /// Record key.
    #[arg(short, long)]
    key: RecordId,

    /// Record value (required for put).
    #[arg(short, long)]
    value: Option<String>,
}

impl CliArgs {
    /// Sanitize command line arguments, return `Ok(op)` on success or
    /// `Err(ReplikvError)` on any error.
    fn sanitize(&self) -> Result<ClientOp, ReplikvError> {
        let op = ClientOp::parse_name(&self.op).ok_or(ReplikvError::msg(
            format!("operation name '{}' unrecognized", self.op),
        ))?;
        if op == ClientOp::Put && self.value.is_none() {
            Err(ReplikvError::msg("put requires a --value"))
        } else {
            Ok(op)
        }
    }
}

/// Actual main function of the client utility.
fn client_main() -> Result<(), ReplikvError> {
    // read in and parse command line arguments
    let args = CliArgs::parse();
    let op = args.sanitize()?;

    // create tokio multi-threaded runtime
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("tokio-worker-client")
        .build()?;

    // enter tokio runtime, issue the command, and print its outcome
    runtime.block_on(async move {
        let mut stub = FrontendApiStub::connect(args.frontend).await?;

        let cmd = match op {
            ClientOp::Put => Command::Put {
                key: args.key,
                value: args.value.unwrap().into_bytes(),
            },
            ClientOp::Get => Command::Get { key: args.key },
            ClientOp::Del => Command::Del { key: args.key },
        };

        match stub.issue(cmd).await? {
            CommandResult::Put(Ok(())) => println!("OK"),
            CommandResult::Del(Ok(())) => println!("OK"),
            CommandResult::Get(Ok(value)) => {
                println!("{}", String::from_utf8_lossy(&value));
            }
            CommandResult::Put(Err(e))
            | CommandResult::Get(Err(e))
            | CommandResult::Del(Err(e)) => {
                return Err(e.into());
            }
        }

        Ok::<(), ReplikvError>(()) // give type hint for this async closure
    })
}

/// Main function of the client utility.
fn main() -> ExitCode {
    logger_init();

    if let Err(ref e) = client_main() {
        pf_error!("client_main exited: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
