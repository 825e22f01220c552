// Filesystem-backed cache database: one directory per record store, one file per record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use super::traits::{CacheStore, StoreProvider};
use super::{metadata_record_key, package_record_key, MetadataRecord};
use crate::config::{LoaderConfig, METADATA_STORE_NAME, PACKAGE_STORE_NAME};
use crate::error::StoreError;

const VERSION_FILE: &str = "VERSION";

pub struct FsStoreProvider {
    root: PathBuf,
    schema_version: u32,
}

impl FsStoreProvider {
    pub fn new(root: impl Into<PathBuf>, schema_version: u32) -> Self {
        Self {
            root: root.into(),
            schema_version,
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(config.db_path(), config.schema_version)
    }

    async fn stored_version(&self) -> Result<Option<u32>, StoreError> {
        match fs::read_to_string(self.root.join(VERSION_FILE)).await {
            // An unreadable version is handled like a missing one: recreate.
            Ok(raw) => Ok(raw.trim().parse().ok()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::open(e)),
        }
    }

    /// Drop both record stores and stamp the current schema version.
    async fn upgrade(&self, from: Option<u32>) -> Result<(), StoreError> {
        info!(
            "cache schema upgrade {:?} -> {} at {}",
            from,
            self.schema_version,
            self.root.display()
        );
        for name in [PACKAGE_STORE_NAME, METADATA_STORE_NAME] {
            match fs::remove_dir_all(self.root.join(name)).await {
                Ok(()) => debug!("dropped record store {}", name),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::open(e)),
            }
        }
        fs::write(self.root.join(VERSION_FILE), self.schema_version.to_string())
            .await
            .map_err(StoreError::open)
    }
}

#[async_trait]
impl StoreProvider for FsStoreProvider {
    async fn open(&self) -> Result<Arc<dyn CacheStore>, StoreError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(StoreError::open)?;

        match self.stored_version().await? {
            Some(v) if v == self.schema_version => {}
            Some(v) if v > self.schema_version => {
                return Err(StoreError::Open(format!(
                    "stored schema version {} is newer than {}",
                    v, self.schema_version
                )));
            }
            other => self.upgrade(other).await?,
        }

        let metadata_dir = self.root.join(METADATA_STORE_NAME);
        let package_dir = self.root.join(PACKAGE_STORE_NAME);
        fs::create_dir_all(&metadata_dir)
            .await
            .map_err(StoreError::open)?;
        fs::create_dir_all(&package_dir)
            .await
            .map_err(StoreError::open)?;

        debug!("cache store opened at {}", self.root.display());
        Ok(Arc::new(FsCacheStore {
            metadata_dir,
            package_dir,
            write_seq: AtomicU64::new(0),
        }))
    }
}

pub struct FsCacheStore {
    metadata_dir: PathBuf,
    package_dir: PathBuf,
    write_seq: AtomicU64,
}

impl FsCacheStore {
    // Record keys contain `/` and `%`; hex keeps them a single flat file name.
    fn record_path(dir: &Path, record_key: &str) -> PathBuf {
        dir.join(hex::encode(record_key.as_bytes()))
    }

    async fn read_record(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::transaction(e)),
        }
    }

    /// Write to a private temp file, then rename over the record.
    async fn write_record(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));
        if let Err(e) = fs::write(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::transaction(e));
        }
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::transaction(e));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = Self::record_path(&self.metadata_dir, &metadata_record_key(key));
        match Self::read_record(&path).await? {
            Some(raw) => {
                let record: MetadataRecord =
                    serde_json::from_slice(&raw).map_err(StoreError::transaction)?;
                Ok(Some(record.content_hash))
            }
            None => Ok(None),
        }
    }

    async fn get_blob(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let path = Self::record_path(&self.package_dir, &package_record_key(key));
        Ok(Self::read_record(&path).await?.map(Bytes::from))
    }

    async fn put_blob(&self, key: &str, bytes: &Bytes) -> Result<(), StoreError> {
        let path = Self::record_path(&self.package_dir, &package_record_key(key));
        self.write_record(&path, bytes).await
    }

    async fn put_metadata(&self, key: &str, content_hash: &str) -> Result<(), StoreError> {
        let record = MetadataRecord {
            content_hash: content_hash.to_string(),
        };
        let raw = serde_json::to_vec(&record).map_err(StoreError::transaction)?;
        let path = Self::record_path(&self.metadata_dir, &metadata_record_key(key));
        self.write_record(&path, &raw).await
    }
}
