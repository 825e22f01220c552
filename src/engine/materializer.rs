// Package materializer: one copy of the package into host memory, one zero-copy view per file.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use crate::config::{FILE_DEPENDENCY_PREFIX, PACKAGE_DEPENDENCY_PREFIX};
use crate::error::LoadError;
use crate::host::traits::{HostRuntime, RunDependency};
use crate::package::manifest::{Manifest, ManifestEntry};

/// A manifest entry waiting for the package bytes.
struct FileRequest {
    entry: ManifestEntry,
    dependency: RunDependency,
}

/// Result of a successful ingest.
#[derive(Debug, Clone)]
pub struct MaterializedPackage {
    /// The host-memory region every file is a view into.
    pub region: Bytes,
    /// Files created, in manifest order.
    pub files: Vec<String>,
}

/// Owns the pending file requests of one load. Created before the package is
/// fetched so the runtime waits for it; dropping it releases whatever is still
/// pending.
pub struct Materializer {
    host: Arc<dyn HostRuntime>,
    order: Vec<String>,
    requests: HashMap<String, FileRequest>,
    package_dependency: RunDependency,
}

impl Materializer {
    /// Register one run dependency per manifest entry and one for the package.
    pub fn new(
        host: Arc<dyn HostRuntime>,
        package_name: &str,
        manifest: &Manifest,
    ) -> Result<Self, LoadError> {
        let mut order = Vec::with_capacity(manifest.len());
        let mut requests = HashMap::with_capacity(manifest.len());

        for entry in manifest.entries() {
            if requests.contains_key(&entry.filename) {
                return Err(LoadError::malformed(format!(
                    "duplicate manifest entry {}",
                    entry.filename
                )));
            }
            let dependency =
                RunDependency::acquire(&host, format!("{}{}", FILE_DEPENDENCY_PREFIX, entry.filename));
            order.push(entry.filename.clone());
            requests.insert(
                entry.filename.clone(),
                FileRequest {
                    entry: entry.clone(),
                    dependency,
                },
            );
        }

        let package_dependency =
            RunDependency::acquire(&host, format!("{}{}", PACKAGE_DEPENDENCY_PREFIX, package_name));

        Ok(Self {
            host,
            order,
            requests,
            package_dependency,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.requests.len()
    }

    /// Copy `bytes` into host memory once and create every pending file as a
    /// view into that region. Bounds and name clashes with existing host files
    /// are checked for all entries before anything is allocated.
    pub fn ingest(mut self, bytes: Bytes) -> Result<MaterializedPackage, LoadError> {
        if bytes.is_empty() {
            return Err(LoadError::malformed("loading data file failed: no package bytes"));
        }
        let blob_len = bytes.len() as u64;
        for (name, request) in &self.requests {
            request.entry.check_bounds(blob_len)?;
            if self.host.file_exists(name) {
                return Err(LoadError::host(format!("file {} already exists", name)));
            }
        }

        let mut region = self.host.allocate(bytes.len())?;
        if region.len() != bytes.len() {
            return Err(LoadError::host(format!(
                "allocator returned {} bytes, asked for {}",
                region.len(),
                bytes.len()
            )));
        }
        region.copy_from_slice(&bytes);
        let region = region.freeze();
        drop(bytes);

        let order = std::mem::take(&mut self.order);
        for name in &order {
            self.resolve(name, &region)?;
        }

        let Self {
            package_dependency, ..
        } = self;
        package_dependency.release();

        info!("materialized {} files from {} bytes", order.len(), region.len());
        Ok(MaterializedPackage {
            region,
            files: order,
        })
    }

    fn resolve(&mut self, name: &str, region: &Bytes) -> Result<(), LoadError> {
        let request = self
            .requests
            .remove(name)
            .ok_or_else(|| LoadError::malformed(format!("{} resolved twice", name)))?;
        let entry = &request.entry;
        if entry.is_compressed || entry.is_audio {
            debug!(
                "{}: compressed={} audio={}, stored as-is",
                name, entry.is_compressed, entry.is_audio
            );
        }

        let view = region.slice(entry.start_offset as usize..entry.end_offset as usize);
        // The view is a slice of a region that never changes, so the filesystem may own it.
        self.host.create_data_file(name, view, true, true, true)?;
        request.dependency.release();
        Ok(())
    }
}
