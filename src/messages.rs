//! Wire-level request/reply types shared by all three roles.

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Record key type.
pub type RecordId = u64;

/// Address of a service endpoint; doubles as a node's identity in the
/// roster and the heartbeat table.
pub type ServiceAddr = SocketAddr;

/// Client request ID type.
pub type RequestId = u64;

/// Canonical operation error kinds. Quorum tallies compare these by value,
/// so two replies reporting the same condition count together regardless of
/// which replica produced them.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum OpError {
    /// Put hit an already-occupied key.
    RecordExists,

    /// Del/Get of a key no replica holds.
    RecordNotFound,

    /// Heartbeat from a node outside the roster.
    UnknownDaemon,

    /// Roster or surviving live set smaller than the required threshold.
    NotEnoughDaemons,

    /// Fan-out completed without enough matching outcomes.
    QuorumNotReached,

    /// Node RPC failed at the transport level.
    NodeUnreachable,

    /// Router RPC failed at the transport level.
    RouterUnreachable,
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpError::RecordExists => write!(f, "record already exists"),
            OpError::RecordNotFound => write!(f, "record not found"),
            OpError::UnknownDaemon => write!(f, "daemon not served here"),
            OpError::NotEnoughDaemons => write!(f, "not enough daemons"),
            OpError::QuorumNotReached => write!(f, "quorum not reached"),
            OpError::NodeUnreachable => write!(f, "node unreachable"),
            OpError::RouterUnreachable => write!(f, "router unreachable"),
        }
    }
}

/// Command issued by a client against the frontend.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Command {
    /// Put a new record under key; fails if the key is occupied.
    Put { key: RecordId, value: Vec<u8> },

    /// Get the record stored under key.
    Get { key: RecordId },

    /// Delete the record stored under key.
    Del { key: RecordId },
}

/// Outcome of a command, as decided by the frontend's quorum rule.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CommandResult {
    Put(Result<(), OpError>),
    Get(Result<Vec<u8>, OpError>),
    Del(Result<(), OpError>),
}

/// Request received by the frontend from a client.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Request ID.
    pub id: RequestId,

    /// Command to run through the quorum engine.
    pub cmd: Command,
}

/// Reply sent back to the client.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ApiReply {
    /// Request ID corresponding to this reply.
    pub id: RequestId,

    /// Quorum decision for the command.
    pub result: CommandResult,
}

/// Request received by a node's record service.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum NodeRequest {
    Put { key: RecordId, value: Vec<u8> },
    Get { key: RecordId },
    Del { key: RecordId },
}

/// Reply from a node's record service.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum NodeReply {
    Put(Result<(), OpError>),
    Get(Result<Vec<u8>, OpError>),
    Del(Result<(), OpError>),
}

/// Request received by the router service.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum RouterRequest {
    /// A node reporting itself alive.
    Heartbeat { node: ServiceAddr },

    /// Ask for the live replica set of a key.
    NodesFind { key: RecordId },

    /// Ask for the full static roster.
    List,
}

/// Reply from the router service.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum RouterReply {
    Heartbeat(Result<(), OpError>),
    NodesFind(Result<Vec<ServiceAddr>, OpError>),
    List(Vec<ServiceAddr>),
}
