// In-process host runtime: heap regions as `BytesMut`, virtual files in a map.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use super::traits::HostRuntime;
use crate::engine::status::{DependencyMonitor, StatusSink};
use crate::error::LoadError;

/// A file created in the virtual filesystem.
#[derive(Debug, Clone)]
pub struct VirtualFile {
    pub name: String,
    pub data: Bytes,
    pub can_read: bool,
    pub can_write: bool,
    pub can_own: bool,
}

pub struct MemoryHost {
    files: RwLock<HashMap<String, VirtualFile>>,
    pending: Mutex<HashSet<String>>,
    added: AtomicUsize,
    removed: AtomicUsize,
    allocated_bytes: AtomicU64,
    memory_limit: u64,
    monitor: DependencyMonitor,
}

impl MemoryHost {
    /// `memory_limit` caps the total bytes handed out by `allocate`.
    pub fn new(memory_limit: u64, status: Arc<dyn StatusSink>) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashSet::new()),
            added: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
            allocated_bytes: AtomicU64::new(0),
            memory_limit,
            monitor: DependencyMonitor::new(status),
        }
    }

    pub fn file(&self, name: &str) -> Option<VirtualFile> {
        self.files.read().get(name).cloned()
    }

    /// Created file names, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    /// Names of dependencies added but not yet removed.
    pub fn pending_dependencies(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pending.lock().iter().cloned().collect();
        names.sort();
        names
    }

    pub fn dependencies_added(&self) -> usize {
        self.added.load(Ordering::Relaxed)
    }

    pub fn dependencies_removed(&self) -> usize {
        self.removed.load(Ordering::Relaxed)
    }

    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// `(done, total)` of the run-dependency countdown.
    pub fn dependency_progress(&self) -> (usize, usize) {
        self.monitor.progress()
    }
}

impl HostRuntime for MemoryHost {
    fn add_run_dependency(&self, name: &str) {
        let left = {
            let mut pending = self.pending.lock();
            if !pending.insert(name.to_string()) {
                warn!("run dependency {} added twice", name);
                return;
            }
            pending.len()
        };
        self.added.fetch_add(1, Ordering::Relaxed);
        self.monitor.observe(left);
    }

    fn remove_run_dependency(&self, name: &str) {
        let left = {
            let mut pending = self.pending.lock();
            if !pending.remove(name) {
                warn!("removing unknown run dependency {}", name);
                return;
            }
            pending.len()
        };
        self.removed.fetch_add(1, Ordering::Relaxed);
        self.monitor.observe(left);
        if left == 0 {
            debug!("all run dependencies fulfilled");
        }
    }

    fn allocate(&self, len: usize) -> Result<BytesMut, LoadError> {
        let len64 = len as u64;
        let limit = self.memory_limit;
        self.allocated_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(len64).filter(|total| *total <= limit)
            })
            .map_err(|used| {
                LoadError::host(format!(
                    "cannot allocate {} bytes: {} of {} in use",
                    len, used, limit
                ))
            })?;
        Ok(BytesMut::zeroed(len))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn create_data_file(
        &self,
        name: &str,
        data: Bytes,
        can_read: bool,
        can_write: bool,
        can_own: bool,
    ) -> Result<(), LoadError> {
        let mut files = self.files.write();
        if files.contains_key(name) {
            return Err(LoadError::host(format!("file {} already exists", name)));
        }
        // Without ownership the filesystem keeps its own copy.
        let data = if can_own {
            data
        } else {
            Bytes::copy_from_slice(&data)
        };
        debug!("virtual file created: {} ({} bytes)", name, data.len());
        files.insert(
            name.to_string(),
            VirtualFile {
                name: name.to_string(),
                data,
                can_read,
                can_write,
                can_own,
            },
        );
        Ok(())
    }
}
