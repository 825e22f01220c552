use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

/// Opens (or creates) the cache database.
#[async_trait]
pub trait StoreProvider: Send + Sync {
    /// Open the store, recreating both record stores on a schema-version bump.
    async fn open(&self) -> Result<Arc<dyn CacheStore>, StoreError>;
}

/// An opened cache database. Either half of an entry may be missing on its own;
/// lookups report that as `None`, never as an error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn get_blob(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    async fn put_blob(&self, key: &str, bytes: &Bytes) -> Result<(), StoreError>;

    async fn put_metadata(&self, key: &str, content_hash: &str) -> Result<(), StoreError>;

    /// Blob first, then metadata. A failure after the blob write leaves the
    /// blob alone in the store, which readers see as a cold entry.
    async fn put_entry(&self, key: &str, content_hash: &str, bytes: &Bytes) -> Result<(), StoreError> {
        self.put_blob(key, bytes).await?;
        self.put_metadata(key, content_hash).await
    }
}

/// Provider used when persistence is turned off. Every open fails, so the
/// loader runs network-only.
pub struct DisabledStore;

#[async_trait]
impl StoreProvider for DisabledStore {
    async fn open(&self) -> Result<Arc<dyn CacheStore>, StoreError> {
        Err(StoreError::Open("cache persistence disabled".to_string()))
    }
}
