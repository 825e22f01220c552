use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::traits::{CacheStore, StoreProvider};
use super::{metadata_record_key, package_record_key, MetadataRecord};
use crate::error::StoreError;

/// In-process cache database. Lives as long as the provider; every `open`
/// returns a handle onto the same records.
#[derive(Default)]
pub struct MemoryCacheStore {
    metadata: RwLock<HashMap<String, MetadataRecord>>,
    packages: RwLock<HashMap<String, Bytes>>,
}

impl MemoryCacheStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of records across both stores.
    pub fn record_count(&self) -> usize {
        self.metadata.read().len() + self.packages.read().len()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .metadata
            .read()
            .get(&metadata_record_key(key))
            .map(|r| r.content_hash.clone()))
    }

    async fn get_blob(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(self.packages.read().get(&package_record_key(key)).cloned())
    }

    async fn put_blob(&self, key: &str, bytes: &Bytes) -> Result<(), StoreError> {
        self.packages
            .write()
            .insert(package_record_key(key), bytes.clone());
        Ok(())
    }

    async fn put_metadata(&self, key: &str, content_hash: &str) -> Result<(), StoreError> {
        self.metadata.write().insert(
            metadata_record_key(key),
            MetadataRecord {
                content_hash: content_hash.to_string(),
            },
        );
        Ok(())
    }
}

pub struct MemoryStoreProvider {
    store: Arc<MemoryCacheStore>,
}

impl MemoryStoreProvider {
    pub fn new(store: Arc<MemoryCacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<MemoryCacheStore> {
        &self.store
    }
}

#[async_trait]
impl StoreProvider for MemoryStoreProvider {
    async fn open(&self) -> Result<Arc<dyn CacheStore>, StoreError> {
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_halves_are_independent() {
        let store = MemoryCacheStore::new();
        store.put_metadata("k", "abc123").await.unwrap();

        assert_eq!(store.get_metadata("k").await.unwrap().as_deref(), Some("abc123"));
        assert!(store.get_blob("k").await.unwrap().is_none());
        assert!(store.get_metadata("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_entry_overwrites() {
        let store = MemoryCacheStore::new();
        store
            .put_entry("k", "old", &Bytes::from_static(b"v1"))
            .await
            .unwrap();
        store
            .put_entry("k", "new", &Bytes::from_static(b"v2"))
            .await
            .unwrap();

        assert_eq!(store.get_metadata("k").await.unwrap().as_deref(), Some("new"));
        assert_eq!(store.get_blob("k").await.unwrap().unwrap(), Bytes::from_static(b"v2"));
        assert_eq!(store.record_count(), 2);
    }
}
