// Loader state machine: one package load from store open to materialized files.

use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::freshness::{check, Freshness};
use super::materializer::{MaterializedPackage, Materializer};
use super::stats::{LoadStats, LoadStatsSnapshot};
use super::status::{download_status, LogStatus, StatusSink};
use super::writer::CacheWriter;
use crate::error::LoadError;
use crate::host::traits::HostRuntime;
use crate::package::descriptor::PackageDescriptor;
use crate::package::manifest::Manifest;
use crate::source::traits::PackageSource;
use crate::store::traits::{CacheStore, StoreProvider};

/// Shown when a load ends in a fatal error; details go to the log.
pub const FAILURE_STATUS: &str = "Loading failed, see log for details";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Init,
    OpeningStore,
    CheckingFreshness,
    FetchingFromCache,
    FetchingFromNetwork,
    WritingCache,
    Materializing,
    Done,
}

/// Everything a load needs to know, fixed at construction.
pub struct LoadContext {
    pub descriptor: PackageDescriptor,
    pub manifest: Manifest,
    pub status: Arc<dyn StatusSink>,
}

impl LoadContext {
    pub fn new(descriptor: PackageDescriptor, manifest: Manifest) -> Self {
        Self {
            descriptor,
            manifest,
            status: Arc::new(LogStatus),
        }
    }

    pub fn with_status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }
}

/// Outcome of a successful load.
#[derive(Debug)]
pub struct LoadReport {
    /// The package was served from the cache.
    pub from_cache: bool,
    /// `None` when the store could not be consulted at all.
    pub freshness: Option<Freshness>,
    /// States entered, in order.
    pub states: Vec<LoadState>,
    pub package: MaterializedPackage,
    pub stats: LoadStatsSnapshot,
    /// Detached cache write started after a network fetch.
    pub cache_write: Option<JoinHandle<()>>,
}

enum CacheOutcome {
    /// Fresh entry, blob read back.
    Hit(Bytes),
    /// Store usable but the entry is stale or absent: fetch and write back.
    Miss {
        store: Arc<dyn CacheStore>,
        freshness: Freshness,
    },
    /// Store unusable for this load: fetch without writing back.
    Bypass { freshness: Option<Freshness> },
}

struct StateTrace {
    package: String,
    states: Vec<LoadState>,
}

impl StateTrace {
    fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            states: vec![LoadState::Init],
        }
    }

    fn enter(&mut self, state: LoadState) {
        debug!("load {}: {:?}", self.package, state);
        self.states.push(state);
    }
}

pub struct PackageLoader {
    context: LoadContext,
    store: Arc<dyn StoreProvider>,
    source: Arc<dyn PackageSource>,
    host: Arc<dyn HostRuntime>,
}

impl PackageLoader {
    pub fn new(
        context: LoadContext,
        store: Arc<dyn StoreProvider>,
        source: Arc<dyn PackageSource>,
        host: Arc<dyn HostRuntime>,
    ) -> Self {
        Self {
            context,
            store,
            source,
            host,
        }
    }

    /// Run one load to completion. Storage failures only change the path
    /// taken; network and materialization failures are returned.
    pub async fn load(&self) -> Result<LoadReport, LoadError> {
        let descriptor = &self.context.descriptor;
        let mut trace = StateTrace::new(&descriptor.package_name);
        let stats = Arc::new(LoadStats::new());

        // Registers the run dependencies; dropping it on any error releases them.
        let materializer = Materializer::new(
            Arc::clone(&self.host),
            &descriptor.package_name,
            &self.context.manifest,
        )
        .map_err(|e| self.fail(e))?;

        let (bytes, from_cache, freshness, cache_write) =
            match self.consult_cache(&mut trace).await {
                CacheOutcome::Hit(bytes) => {
                    stats.record_cache_hit(bytes.len() as u64);
                    (bytes, true, Some(Freshness::Fresh), None)
                }
                CacheOutcome::Miss { store, freshness } => {
                    let bytes = self.fetch_remote(&mut trace, &stats).await?;
                    trace.enter(LoadState::WritingCache);
                    let handle = CacheWriter::new(store, Arc::clone(&stats)).spawn(
                        descriptor.cache_key.clone(),
                        descriptor.content_hash.clone(),
                        bytes.clone(),
                    );
                    (bytes, false, Some(freshness), Some(handle))
                }
                CacheOutcome::Bypass { freshness } => {
                    let bytes = self.fetch_remote(&mut trace, &stats).await?;
                    (bytes, false, freshness, None)
                }
            };

        trace.enter(LoadState::Materializing);
        let package = materializer.ingest(bytes).map_err(|e| self.fail(e))?;
        stats.record_files(package.files.len() as u32);

        trace.enter(LoadState::Done);
        info!(
            "loaded {} ({} files, from_cache={})",
            descriptor.package_name,
            package.files.len(),
            from_cache
        );

        Ok(LoadReport {
            from_cache,
            freshness,
            states: trace.states,
            package,
            stats: stats.snapshot(),
            cache_write,
        })
    }

    /// Open the store, check freshness and, on a fresh entry, read the blob.
    /// Every failure here means "use the network", never an error.
    async fn consult_cache(&self, trace: &mut StateTrace) -> CacheOutcome {
        let descriptor = &self.context.descriptor;

        trace.enter(LoadState::OpeningStore);
        let store = match self.store.open().await {
            Ok(store) => store,
            Err(e) => {
                warn!("{}; falling back to network", e);
                return CacheOutcome::Bypass { freshness: None };
            }
        };

        trace.enter(LoadState::CheckingFreshness);
        let stored = match store.get_metadata(&descriptor.cache_key).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("{}; falling back to network", e);
                return CacheOutcome::Bypass { freshness: None };
            }
        };
        let freshness = check(stored.as_deref(), &descriptor.content_hash);
        if !freshness.is_fresh() {
            info!(
                "loading {} from remote ({:?} cache entry)",
                descriptor.package_name, freshness
            );
            return CacheOutcome::Miss { store, freshness };
        }

        info!("loading {} from cache", descriptor.package_name);
        trace.enter(LoadState::FetchingFromCache);
        match store.get_blob(&descriptor.cache_key).await {
            Ok(Some(bytes)) if !bytes.is_empty() => CacheOutcome::Hit(bytes),
            Ok(_) => {
                warn!(
                    "cached package {} has metadata but no blob; falling back to network",
                    descriptor.cache_key
                );
                CacheOutcome::Bypass {
                    freshness: Some(freshness),
                }
            }
            Err(e) => {
                warn!("{}; falling back to network", e);
                CacheOutcome::Bypass {
                    freshness: Some(freshness),
                }
            }
        }
    }

    async fn fetch_remote(
        &self,
        trace: &mut StateTrace,
        stats: &LoadStats,
    ) -> Result<Bytes, LoadError> {
        let descriptor = &self.context.descriptor;
        trace.enter(LoadState::FetchingFromNetwork);
        self.context.status.set_status(&download_status(0, descriptor.expected_size));

        let status = Arc::clone(&self.context.status);
        let on_progress = move |loaded: u64, total: u64| {
            status.set_status(&download_status(loaded, total));
        };
        let bytes = self
            .source
            .fetch(&descriptor.remote_url, descriptor.expected_size, &on_progress)
            .await
            .map_err(|e| self.fail(e))?;

        stats.record_network(bytes.len() as u64);
        Ok(bytes)
    }

    fn fail(&self, err: LoadError) -> LoadError {
        error!("package error: {}", err);
        self.context.status.set_status(FAILURE_STATUS);
        err
    }
}

/// Report whether a fresh copy of the package is already cached, without
/// loading it. Any storage failure reads as `Absent`.
pub async fn probe_cache(store: &dyn StoreProvider, descriptor: &PackageDescriptor) -> Freshness {
    let store = match store.open().await {
        Ok(store) => store,
        Err(e) => {
            debug!("cache probe: {}", e);
            return Freshness::Absent;
        }
    };
    match store.get_metadata(&descriptor.cache_key).await {
        Ok(stored) => check(stored.as_deref(), &descriptor.content_hash),
        Err(e) => {
            debug!("cache probe: {}", e);
            Freshness::Absent
        }
    }
}
