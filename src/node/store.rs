//! In-memory record map of a node.
//!
//! Records are immutable once written: a key is either present or absent,
//! there is no update. A put to an occupied key is rejected rather than
//! overwriting.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::messages::{OpError, RecordId};

/// The record map, guarded by one reader-writer lock. Records live for the
/// lifetime of the node process.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: RwLock<HashMap<RecordId, Vec<u8>>>,
}

impl RecordStore {
    /// Creates an empty record store.
    pub fn new() -> Self {
        RecordStore {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Stores a record under `key` if no record exists for it yet; returns
    /// `RecordExists` otherwise.
    pub async fn put(
        &self,
        key: RecordId,
        value: Vec<u8>,
    ) -> Result<(), OpError> {
        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Err(OpError::RecordExists);
        }
        records.insert(key, value);
        Ok(())
    }

    /// Fetches the record stored under `key`; returns `RecordNotFound` if
    /// absent.
    pub async fn get(&self, key: RecordId) -> Result<Vec<u8>, OpError> {
        let records = self.records.read().await;
        records.get(&key).cloned().ok_or(OpError::RecordNotFound)
    }

    /// Deletes the record stored under `key`; returns `RecordNotFound` if
    /// absent.
    pub async fn del(&self, key: RecordId) -> Result<(), OpError> {
        let mut records = self.records.write().await;
        match records.remove(&key) {
            Some(_) => Ok(()),
            None => Err(OpError::RecordNotFound),
        }
    }
}

#[cfg(test)]
mod store_tests {
    use super::*;
    use rand::Rng;
    use std::collections::HashMap;

    #[tokio::test]
    async fn get_empty() {
        let store = RecordStore::new();
        assert_eq!(store.get(7).await, Err(OpError::RecordNotFound));
    }

    #[tokio::test]
    async fn put_get_del() {
        let store = RecordStore::new();
        assert_eq!(store.put(7, b"hello".to_vec()).await, Ok(()));
        assert_eq!(store.get(7).await, Ok(b"hello".to_vec()));
        assert_eq!(store.del(7).await, Ok(()));
        assert_eq!(store.get(7).await, Err(OpError::RecordNotFound));
    }

    #[tokio::test]
    async fn put_occupied_key() {
        let store = RecordStore::new();
        assert_eq!(store.put(7, b"hello".to_vec()).await, Ok(()));
        assert_eq!(
            store.put(7, b"world".to_vec()).await,
            Err(OpError::RecordExists)
        );
        // the original record is untouched
        assert_eq!(store.get(7).await, Ok(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn del_missing_key() {
        let store = RecordStore::new();
        assert_eq!(store.del(7).await, Err(OpError::RecordNotFound));
    }

    #[tokio::test]
    async fn put_rand_get_rand() {
        let store = RecordStore::new();
        let mut ref_map: HashMap<RecordId, Vec<u8>> = HashMap::new();
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let key = rng.gen_range(0..50);
            let value: Vec<u8> = (0..8).map(|_| rng.gen()).collect();
            let expect = if ref_map.contains_key(&key) {
                Err(OpError::RecordExists)
            } else {
                ref_map.insert(key, value.clone());
                Ok(())
            };
            assert_eq!(store.put(key, value).await, expect);
        }

        for key in 0..50 {
            assert_eq!(
                store.get(key).await,
                ref_map
                    .get(&key)
                    .cloned()
                    .ok_or(OpError::RecordNotFound)
            );
        }
    }
}
