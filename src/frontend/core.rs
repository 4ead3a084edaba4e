//! Frontend core: the quorum fan-out engine.
//!
//! Writes ask the router for the live replica set; reads use a one-shot
//! cached roster plus the shared placement function and rely on per-RPC
//! failures to prune dead nodes. Either way the decision is "at least
//! `MIN_REDUNDANCY` matching outcomes".

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, OnceCell};
use tokio::time::{self, Duration};

use crate::client::{NodeClient, RouterClient};
use crate::messages::{OpError, RecordId, ServiceAddr};
use crate::placement;
use crate::MIN_REDUNDANCY;

/// A write operation to fan out to every replica. Put carries the record
/// payload; Del takes none.
#[derive(Clone)]
enum WriteOp {
    Put(Vec<u8>),
    Del,
}

/// Frontend core state, generic over the node and router clients.
pub struct Frontend<NC, RC> {
    /// Address of the router service.
    router: ServiceAddr,

    /// Delay between roster fetch attempts on the read path.
    init_timeout: Duration,

    /// Client for node record RPCs, shared with fan-out tasks.
    nc: Arc<NC>,

    /// Client for router RPCs.
    rc: RC,

    /// Roster fetched from the router on the first Get and kept for the
    /// lifetime of this frontend. The roster is fixed at router
    /// construction, so one successful fetch is enough.
    roster: OnceCell<Vec<ServiceAddr>>,
}

impl<NC, RC> Frontend<NC, RC>
where
    NC: NodeClient,
    RC: RouterClient,
{
    /// Creates a new frontend core talking to the given router.
    pub fn new(
        router: ServiceAddr,
        init_timeout: Duration,
        nc: NC,
        rc: RC,
    ) -> Self {
        Frontend {
            router,
            init_timeout,
            nc: Arc::new(nc),
            rc,
            roster: OnceCell::new(),
        }
    }

    /// Puts a record under `key` if no record exists for it yet.
    pub async fn put(
        &self,
        key: RecordId,
        value: Vec<u8>,
    ) -> Result<(), OpError> {
        self.apply_write(key, WriteOp::Put(value)).await
    }

    /// Deletes the record under `key` if one exists.
    pub async fn del(&self, key: RecordId) -> Result<(), OpError> {
        self.apply_write(key, WriteOp::Del).await
    }

    /// Shared Put/Del quorum engine: fans `op` out to the live replica set
    /// and tallies all replies.
    async fn apply_write(
        &self,
        key: RecordId,
        op: WriteOp,
    ) -> Result<(), OpError> {
        // router errors surface to the caller verbatim
        let nodes = self.rc.nodes_find(self.router, key).await?;
        if nodes.len() < MIN_REDUNDANCY {
            // the router already enforces this
            return Err(OpError::NotEnoughDaemons);
        }

        // every task writes exactly one result, so capacity = fan-out
        // width guarantees no task ever blocks on send
        let (tx_result, mut rx_result) = mpsc::channel(nodes.len());
        for &node in &nodes {
            let nc = self.nc.clone();
            let op = op.clone();
            let tx_result = tx_result.clone();
            tokio::spawn(async move {
                let result = match op {
                    WriteOp::Put(value) => nc.put(node, key, value).await,
                    WriteOp::Del => nc.del(node, key).await,
                };
                let _ = tx_result.send(result).await;
            });
        }
        drop(tx_result);

        // wait for all replies; with mixed successes and agreeing errors,
        // only the full tally distinguishes a real quorum from an
        // accidental majority
        let mut ok_count = 0;
        let mut err_counts: HashMap<OpError, usize> = HashMap::new();
        for _ in 0..nodes.len() {
            match rx_result.recv().await {
                Some(Ok(())) => ok_count += 1,
                Some(Err(err)) => *err_counts.entry(err).or_insert(0) += 1,
                None => break,
            }
        }

        if ok_count >= MIN_REDUNDANCY {
            return Ok(());
        }
        for (err, count) in err_counts {
            if count >= MIN_REDUNDANCY {
                // the replicas agree the operation is illegitimate
                return Err(err);
            }
        }
        Err(OpError::QuorumNotReached)
    }

    /// Gets the record under `key`, returning the byte buffer that at
    /// least `MIN_REDUNDANCY` replicas agree on.
    pub async fn get(&self, key: RecordId) -> Result<Vec<u8>, OpError> {
        // the read path bypasses the router: replicas are computed locally
        // from the cached roster, and dead nodes are pruned by their RPCs
        // failing
        let roster = self.cached_roster().await;
        let nodes = placement::nodes_find(key, roster);

        let (tx_result, mut rx_result) = mpsc::channel(nodes.len().max(1));
        for &node in &nodes {
            let nc = self.nc.clone();
            let tx_result = tx_result.clone();
            tokio::spawn(async move {
                let _ = tx_result.send(nc.get(node, key).await).await;
            });
        }
        drop(tx_result);

        // tally in arrival order; once any counter reaches the quorum
        // threshold the remaining replies cannot change the outcome
        let mut data_counts: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut err_counts: HashMap<OpError, usize> = HashMap::new();
        for _ in 0..nodes.len() {
            match rx_result.recv().await {
                Some(Ok(data)) => {
                    let count = data_counts.entry(data.clone()).or_insert(0);
                    *count += 1;
                    if *count >= MIN_REDUNDANCY {
                        return Ok(data);
                    }
                }
                Some(Err(err)) => {
                    let count = err_counts.entry(err).or_insert(0);
                    *count += 1;
                    if *count >= MIN_REDUNDANCY {
                        return Err(err);
                    }
                }
                None => break,
            }
        }
        Err(OpError::QuorumNotReached)
    }

    /// Returns the cached roster, fetching it from the router on the first
    /// call. Concurrent first-callers coalesce into exactly one fetch;
    /// fetch failures are retried indefinitely with `init_timeout` sleeps
    /// in between.
    async fn cached_roster(&self) -> &Vec<ServiceAddr> {
        self.roster
            .get_or_init(|| async {
                loop {
                    match self.rc.list(self.router).await {
                        Ok(roster) => {
                            pf_info!(
                                "fetched roster of {} nodes from router",
                                roster.len()
                            );
                            return roster;
                        }
                        Err(e) => {
                            pf_warn!("error fetching roster: {}", e);
                            time::sleep(self.init_timeout).await;
                        }
                    }
                }
            })
            .await
    }
}
