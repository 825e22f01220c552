use async_trait::async_trait;
use bytes::Bytes;

use crate::error::LoadError;

/// Progress callback: `(loaded, total)` where `total` is the expected size.
pub type ProgressFn = dyn Fn(u64, u64) + Send + Sync;

/// Retrieves the whole package in one request. No bytes are returned before
/// the transfer completes.
#[async_trait]
pub trait PackageSource: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        expected_size: u64,
        on_progress: &ProgressFn,
    ) -> Result<Bytes, LoadError>;
}

/// Status codes that complete a package fetch.
pub const ACCEPTED_STATUSES: [u16; 3] = [200, 304, 206];

/// Status 0 (local file access) only counts when a body came back.
pub fn is_acceptable_status(status: u16, body_len: usize) -> bool {
    ACCEPTED_STATUSES.contains(&status) || (status == 0 && body_len > 0)
}
