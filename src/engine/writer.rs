use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::stats::LoadStats;
use crate::store::traits::CacheStore;

/// Best-effort persistence of a freshly fetched package.
pub struct CacheWriter {
    store: Arc<dyn CacheStore>,
    stats: Arc<LoadStats>,
}

impl CacheWriter {
    pub fn new(store: Arc<dyn CacheStore>, stats: Arc<LoadStats>) -> Self {
        Self { store, stats }
    }

    /// Write the entry and hand `bytes` back unchanged whether or not the write
    /// succeeded.
    pub async fn persist(&self, key: &str, content_hash: &str, bytes: Bytes) -> Bytes {
        match self.store.put_entry(key, content_hash, &bytes).await {
            Ok(()) => debug!("cached {} ({} bytes, hash {})", key, bytes.len(), content_hash),
            Err(e) => {
                self.stats.record_cache_write_failure();
                warn!("failed to cache {}: {}", key, e);
            }
        }
        bytes
    }

    /// Run `persist` detached. Nothing downstream waits on the handle.
    pub fn spawn(self, key: String, content_hash: String, bytes: Bytes) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.persist(&key, &content_hash, bytes).await;
        })
    }
}
