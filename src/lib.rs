//! Public interface to the RepliKV core library, linked by the three role
//! executables and the client utility.

#[macro_use]
mod utils;

mod client;
mod frontend;
mod messages;
mod node;
mod placement;
mod router;

pub use client::{
    FrontendApiStub, NodeClient, RouterClient, TcpNodeClient, TcpRouterClient,
};
pub use frontend::{Frontend, FrontendApiService, FrontendConfig};
pub use messages::{
    ApiReply, ApiRequest, Command, CommandResult, NodeReply, NodeRequest,
    OpError, RecordId, RequestId, RouterReply, RouterRequest, ServiceAddr,
};
pub use node::{NodeConfig, NodeService, RecordStore};
pub use placement::nodes_find;
pub use router::{Router, RouterConfig, RouterService};
pub use utils::{logger_init, ReplikvError};

/// Number of nodes a record is replicated onto.
pub const REPLICATION_FACTOR: usize = 3;

/// Minimum number of matching outcomes for a quorum decision.
pub const MIN_REDUNDANCY: usize = 2;

// the quorum rule is meaningless otherwise
const _: () = assert!(REPLICATION_FACTOR >= MIN_REDUNDANCY && MIN_REDUNDANCY >= 1);
