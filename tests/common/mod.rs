// Shared fakes for the loader integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use love_package_loader::engine::status::StatusSink;
use love_package_loader::error::{LoadError, StoreError};
use love_package_loader::host::memory_host::MemoryHost;
use love_package_loader::host::traits::HostRuntime;
use love_package_loader::source::traits::{PackageSource, ProgressFn};
use love_package_loader::store::memory_store::MemoryCacheStore;
use love_package_loader::store::traits::{CacheStore, StoreProvider};

/// Deterministic package content.
pub fn package_bytes(len: usize) -> Bytes {
    (0..len).map(|i| (i % 256) as u8).collect::<Vec<u8>>().into()
}

pub fn memory_host() -> (Arc<MemoryHost>, Arc<dyn HostRuntime>) {
    let host = Arc::new(MemoryHost::new(64 * 1024 * 1024, Arc::new(|_: &str| {})));
    let dyn_host: Arc<dyn HostRuntime> = host.clone();
    (host, dyn_host)
}

/// Serves a fixed body and counts fetches.
pub struct StaticSource {
    body: Bytes,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(body: Bytes) -> Arc<Self> {
        Arc::new(Self {
            body,
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackageSource for StaticSource {
    async fn fetch(
        &self,
        _url: &str,
        expected_size: u64,
        on_progress: &ProgressFn,
    ) -> Result<Bytes, LoadError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let len = self.body.len() as u64;
        on_progress(len / 2, expected_size);
        on_progress(len, expected_size);
        Ok(self.body.clone())
    }
}

/// Always fails like an unreachable server.
pub struct DownSource;

#[async_trait]
impl PackageSource for DownSource {
    async fn fetch(&self, url: &str, _: u64, _: &ProgressFn) -> Result<Bytes, LoadError> {
        Err(LoadError::network(url, "connection refused"))
    }
}

/// Store provider whose open always fails.
pub struct UnavailableStore;

#[async_trait]
impl StoreProvider for UnavailableStore {
    async fn open(&self) -> Result<Arc<dyn CacheStore>, StoreError> {
        Err(StoreError::Open("storage blocked".to_string()))
    }
}

/// Wraps a memory store and fails selected operations.
pub struct FlakyStore {
    pub inner: Arc<MemoryCacheStore>,
    pub fail_metadata_reads: bool,
    pub fail_blob_reads: bool,
    pub fail_writes: bool,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryCacheStore>) -> Self {
        Self {
            inner,
            fail_metadata_reads: false,
            fail_blob_reads: false,
            fail_writes: false,
        }
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_metadata_reads {
            return Err(StoreError::Transaction("metadata read failed".to_string()));
        }
        self.inner.get_metadata(key).await
    }

    async fn get_blob(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        if self.fail_blob_reads {
            return Err(StoreError::Transaction("blob read failed".to_string()));
        }
        self.inner.get_blob(key).await
    }

    async fn put_blob(&self, key: &str, bytes: &Bytes) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Transaction("quota exceeded".to_string()));
        }
        self.inner.put_blob(key, bytes).await
    }

    async fn put_metadata(&self, key: &str, content_hash: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Transaction("quota exceeded".to_string()));
        }
        self.inner.put_metadata(key, content_hash).await
    }
}

pub struct FlakyProvider(pub Arc<FlakyStore>);

#[async_trait]
impl StoreProvider for FlakyProvider {
    async fn open(&self) -> Result<Arc<dyn CacheStore>, StoreError> {
        Ok(self.0.clone())
    }
}

/// Records every status line.
#[derive(Default)]
pub struct RecordingStatus {
    lines: Mutex<Vec<String>>,
}

impl RecordingStatus {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl StatusSink for RecordingStatus {
    fn set_status(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }
}
