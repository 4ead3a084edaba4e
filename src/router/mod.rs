//! The router role: holds the static node roster, tracks per-node
//! heartbeat freshness, and answers replica-set queries.

mod service;
mod tracker;

pub use service::RouterService;
pub use tracker::{Router, RouterConfig};
