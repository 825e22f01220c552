use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::LoadError;

/// What the loader needs from the game runtime.
pub trait HostRuntime: Send + Sync {
    /// Block runtime startup until the matching `remove_run_dependency`.
    fn add_run_dependency(&self, name: &str);

    fn remove_run_dependency(&self, name: &str);

    /// Allocate a zeroed region of exactly `len` bytes of host memory.
    fn allocate(&self, len: usize) -> Result<BytesMut, LoadError>;

    fn file_exists(&self, name: &str) -> bool;

    /// Create a file in the runtime's virtual filesystem backed by `data`.
    /// With `can_own` the filesystem keeps `data` instead of copying it.
    fn create_data_file(
        &self,
        name: &str,
        data: Bytes,
        can_read: bool,
        can_write: bool,
        can_own: bool,
    ) -> Result<(), LoadError>;
}

/// A held run dependency. Released exactly once: explicitly through
/// [`RunDependency::release`] or when dropped on an error path.
pub struct RunDependency {
    name: String,
    host: Arc<dyn HostRuntime>,
}

impl RunDependency {
    pub fn acquire(host: &Arc<dyn HostRuntime>, name: impl Into<String>) -> Self {
        let name = name.into();
        host.add_run_dependency(&name);
        debug!("run dependency added: {}", name);
        Self {
            name,
            host: Arc::clone(host),
        }
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for RunDependency {
    fn drop(&mut self) {
        self.host.remove_run_dependency(&self.name);
        debug!("run dependency removed: {}", self.name);
    }
}

impl std::fmt::Debug for RunDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RunDependency").field(&self.name).finish()
    }
}
