//! Deterministic replica placement shared by the router and the frontend.
//!
//! Every candidate node gets a pseudorandom score derived from the record
//! key and the node's address; the replica set is the top
//! `REPLICATION_FACTOR` candidates by that score. Because the score of a
//! node does not depend on which other nodes are in the candidate set,
//! filtering the set never reorders the survivors.

use rapidhash::v3::rapidhash_v3;

use crate::messages::{RecordId, ServiceAddr};
use crate::REPLICATION_FACTOR;

/// Returns the ordered replica set for `key` chosen among `candidates`, of
/// length `min(REPLICATION_FACTOR, candidates.len())`. Both the router and
/// the frontend must call this same function so that reads and writes
/// converge on the same nodes without coordination.
pub fn nodes_find(key: RecordId, candidates: &[ServiceAddr]) -> Vec<ServiceAddr> {
    let mut ranked: Vec<(u64, String, ServiceAddr)> = candidates
        .iter()
        .map(|&addr| {
            let addr_str = addr.to_string();
            (placement_score(key, &addr_str), addr_str, addr)
        })
        .collect();

    // ascending by score, ties broken by address string
    ranked.sort_unstable_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    ranked.truncate(REPLICATION_FACTOR);

    ranked.into_iter().map(|(_, _, addr)| addr).collect()
}

/// Stable, portable score of a (key, address) pair. The same bytes hash to
/// the same score on every platform and in every process.
fn placement_score(key: RecordId, addr_str: &str) -> u64 {
    let mut buf = Vec::with_capacity(8 + addr_str.len());
    buf.extend_from_slice(&key.to_be_bytes());
    buf.extend_from_slice(addr_str.as_bytes());
    rapidhash_v3(&buf)
}

#[cfg(test)]
mod placement_tests {
    use super::*;
    use rand::Rng;

    fn gen_roster(size: usize) -> Vec<ServiceAddr> {
        (0..size)
            .map(|i| format!("127.0.0.1:{}", 52700 + i).parse().unwrap())
            .collect()
    }

    #[test]
    fn deterministic() {
        let roster = gen_roster(10);
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let key: RecordId = rng.gen();
            assert_eq!(nodes_find(key, &roster), nodes_find(key, &roster));
        }
    }

    #[test]
    fn size_contract() {
        let mut rng = rand::thread_rng();
        for size in 0..8 {
            let roster = gen_roster(size);
            let key: RecordId = rng.gen();
            assert_eq!(
                nodes_find(key, &roster).len(),
                size.min(REPLICATION_FACTOR)
            );
        }
    }

    #[test]
    fn no_duplicates() {
        let roster = gen_roster(6);
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let key: RecordId = rng.gen();
            let replicas = nodes_find(key, &roster);
            for (i, a) in replicas.iter().enumerate() {
                assert!(!replicas[i + 1..].contains(a));
            }
        }
    }

    #[test]
    fn stable_under_filtering() {
        // removing candidates must preserve the relative order of the
        // survivors; new candidates may only be admitted at the tail
        let roster = gen_roster(8);
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let key: RecordId = rng.gen();
            let full = nodes_find(key, &roster);

            let subset: Vec<ServiceAddr> = roster
                .iter()
                .copied()
                .filter(|_| rng.gen_bool(0.7))
                .collect();
            let filtered = nodes_find(key, &subset);

            let full_surviving: Vec<ServiceAddr> = full
                .iter()
                .copied()
                .filter(|a| subset.contains(a))
                .collect();
            assert_eq!(
                filtered[..full_surviving.len()],
                full_surviving[..],
            );
        }
    }

    #[test]
    fn keys_spread_across_nodes() {
        // not a strict balance guarantee, just a sanity check that the
        // ranking is actually key-dependent
        let roster = gen_roster(5);
        let firsts: std::collections::HashSet<ServiceAddr> =
            (0..64).map(|key| nodes_find(key, &roster)[0]).collect();
        assert!(firsts.len() > 1);
    }
}
