//! Router core: the static roster plus the heartbeat-based liveness
//! tracker.

use std::collections::HashMap;

use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use crate::messages::{OpError, RecordId, ServiceAddr};
use crate::placement;
use crate::{MIN_REDUNDANCY, REPLICATION_FACTOR};

/// Configuration parameters struct.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// A node that has not heartbeated for this many millisecs is treated
    /// as dead.
    pub forget_timeout_ms: u64,
}

#[allow(clippy::derivable_impls)]
impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            forget_timeout_ms: 5000,
        }
    }
}

/// Router core state. The roster is fixed at construction; only the
/// heartbeat timestamps mutate at runtime.
pub struct Router {
    /// All nodes served by this router.
    nodes: Vec<ServiceAddr>,

    /// Maximum heartbeat age before a node is considered dead.
    forget_timeout: Duration,

    /// Last-heartbeat timestamp per roster node.
    heartbeat: RwLock<HashMap<ServiceAddr, Instant>>,
}

impl Router {
    /// Creates a new router serving the given roster. Returns
    /// `NotEnoughDaemons` if fewer than `REPLICATION_FACTOR` nodes were
    /// given. Every heartbeat is seeded with "now" so a freshly started
    /// system is usable before any real heartbeat arrives.
    pub fn new(
        nodes: Vec<ServiceAddr>,
        forget_timeout: Duration,
    ) -> Result<Self, OpError> {
        if nodes.len() < REPLICATION_FACTOR {
            return Err(OpError::NotEnoughDaemons);
        }

        let now = Instant::now();
        let heartbeat = nodes.iter().map(|&node| (node, now)).collect();

        Ok(Router {
            nodes,
            forget_timeout,
            heartbeat: RwLock::new(heartbeat),
        })
    }

    /// Registers a heartbeat from `node`, stamping "now" over its previous
    /// timestamp. Returns `UnknownDaemon` if the node is not in the roster.
    pub async fn heartbeat(&self, node: ServiceAddr) -> Result<(), OpError> {
        let mut heartbeat = self.heartbeat.write().await;
        match heartbeat.get_mut(&node) {
            Some(stamp) => {
                *stamp = Instant::now();
                Ok(())
            }
            None => Err(OpError::UnknownDaemon),
        }
    }

    /// Returns the nodes where the record with key `key` should live,
    /// filtered down to those whose heartbeat is fresh enough. Returns
    /// `NotEnoughDaemons` if fewer than `MIN_REDUNDANCY` survive the
    /// filter.
    pub async fn nodes_find(
        &self,
        key: RecordId,
    ) -> Result<Vec<ServiceAddr>, OpError> {
        let candidates = placement::nodes_find(key, &self.nodes);
        let now = Instant::now();

        let mut found = Vec::with_capacity(candidates.len());
        for node in candidates {
            let heartbeat = self.heartbeat.read().await;
            // saturating: a heartbeat may land between capturing `now` and
            // reading the stamp
            if now.saturating_duration_since(heartbeat[&node])
                <= self.forget_timeout
            {
                found.push(node);
            }
        }

        if found.len() < MIN_REDUNDANCY {
            return Err(OpError::NotEnoughDaemons);
        }
        Ok(found)
    }

    /// Returns the full static roster. Heartbeats are not consulted.
    pub fn list(&self) -> Vec<ServiceAddr> {
        self.nodes.clone()
    }
}

#[cfg(test)]
mod tracker_tests {
    use super::*;
    use tokio::time;

    fn gen_roster(size: usize) -> Vec<ServiceAddr> {
        (0..size)
            .map(|i| format!("127.0.0.1:{}", 52800 + i).parse().unwrap())
            .collect()
    }

    #[test]
    fn reject_small_roster() {
        for size in 0..REPLICATION_FACTOR {
            assert_eq!(
                Router::new(gen_roster(size), Duration::from_secs(5)).err(),
                Some(OpError::NotEnoughDaemons)
            );
        }
        assert!(
            Router::new(gen_roster(REPLICATION_FACTOR), Duration::from_secs(5))
                .is_ok()
        );
    }

    #[tokio::test]
    async fn heartbeat_unknown_daemon() {
        let router =
            Router::new(gen_roster(3), Duration::from_secs(5)).unwrap();
        let stranger: ServiceAddr = "127.0.0.1:59999".parse().unwrap();
        assert_eq!(
            router.heartbeat(stranger).await,
            Err(OpError::UnknownDaemon)
        );
        assert_eq!(router.heartbeat(gen_roster(3)[0]).await, Ok(()));
    }

    #[tokio::test]
    async fn list_returns_whole_roster() {
        let roster = gen_roster(5);
        let router =
            Router::new(roster.clone(), Duration::from_secs(5)).unwrap();
        assert_eq!(router.list(), roster);
    }

    #[tokio::test]
    async fn all_alive_matches_placement() {
        // fresh construction seeds every heartbeat with "now", so the live
        // filter must pass placement output through unchanged
        let roster = gen_roster(5);
        let router =
            Router::new(roster.clone(), Duration::from_secs(5)).unwrap();
        for key in 0..32 {
            assert_eq!(
                router.nodes_find(key).await,
                Ok(placement::nodes_find(key, &roster))
            );
        }
    }

    #[tokio::test]
    async fn forgotten_nodes_filtered() {
        let roster = gen_roster(3);
        let router =
            Router::new(roster.clone(), Duration::from_millis(50)).unwrap();

        // let every seeded heartbeat expire, then revive all but one node
        time::sleep(Duration::from_millis(120)).await;
        router.heartbeat(roster[0]).await.unwrap();
        router.heartbeat(roster[1]).await.unwrap();

        for key in 0..32 {
            let found = router.nodes_find(key).await.unwrap();
            assert_eq!(found.len(), 2);
            assert!(!found.contains(&roster[2]));
            // survivors keep their placement order
            let expected: Vec<ServiceAddr> =
                placement::nodes_find(key, &roster)
                    .into_iter()
                    .filter(|node| *node != roster[2])
                    .collect();
            assert_eq!(found, expected);
        }
    }

    #[tokio::test]
    async fn not_enough_live_nodes() {
        let roster = gen_roster(3);
        let router =
            Router::new(roster.clone(), Duration::from_millis(50)).unwrap();

        time::sleep(Duration::from_millis(120)).await;
        router.heartbeat(roster[0]).await.unwrap();

        assert_eq!(
            router.nodes_find(7).await,
            Err(OpError::NotEnoughDaemons)
        );
    }
}
