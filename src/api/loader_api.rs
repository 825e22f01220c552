// One-call entry points wiring the configured store and source for a deployed package.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::LoaderConfig;
use crate::engine::freshness::Freshness;
use crate::engine::loader::{probe_cache, LoadContext, LoadReport, PackageLoader};
use crate::engine::status::StatusSink;
use crate::host::traits::HostRuntime;
use crate::package::deploy::DeployedPackage;
use crate::source::file_source::FileSource;
use crate::source::http_source::HttpSource;
use crate::source::traits::PackageSource;
use crate::store::fs_store::FsStoreProvider;
use crate::store::traits::{DisabledStore, StoreProvider};

pub fn store_for(config: &LoaderConfig) -> Arc<dyn StoreProvider> {
    if config.persist_cache {
        Arc::new(FsStoreProvider::from_config(config))
    } else {
        Arc::new(DisabledStore)
    }
}

/// HTTP(S) URLs go over the network; anything else is read from `local_root`.
pub fn source_for(remote_url: &str, local_root: &Path) -> Arc<dyn PackageSource> {
    if remote_url.starts_with("http://") || remote_url.starts_with("https://") {
        Arc::new(HttpSource::default())
    } else {
        Arc::new(FileSource::new(local_root))
    }
}

/// Load a deployed package into `host`.
pub async fn load_deployed(
    config: &LoaderConfig,
    deployed: &DeployedPackage,
    host: Arc<dyn HostRuntime>,
    status: Arc<dyn StatusSink>,
    local_root: &Path,
) -> Result<LoadReport> {
    deployed.check_memory()?;
    let descriptor = deployed.descriptor();
    let source = source_for(&descriptor.remote_url, local_root);
    let context = LoadContext::new(descriptor, deployed.manifest()).with_status(status);
    let loader = PackageLoader::new(context, store_for(config), source, host);
    loader
        .load()
        .await
        .with_context(|| format!("loading package {}", deployed.game_file))
}

/// Whether a fresh copy of the deployed package is already cached.
pub async fn is_cached(config: &LoaderConfig, deployed: &DeployedPackage) -> bool {
    let store = store_for(config);
    probe_cache(store.as_ref(), &deployed.descriptor()).await == Freshness::Fresh
}
