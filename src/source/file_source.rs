use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::traits::{is_acceptable_status, PackageSource, ProgressFn};
use crate::error::LoadError;

/// Reads the package from local disk. Local access has no HTTP status, which
/// is reported as status 0: only a non-empty file completes the fetch.
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    /// URL paths, root-relative ones included, resolve against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Only an explicit `file://` URL names a path outside `root`.
    fn resolve(&self, url: &str) -> PathBuf {
        match url.strip_prefix("file://") {
            Some(path) => PathBuf::from(path),
            None => self.root.join(url.trim_start_matches('/')),
        }
    }
}

#[async_trait]
impl PackageSource for FileSource {
    async fn fetch(
        &self,
        url: &str,
        expected_size: u64,
        on_progress: &ProgressFn,
    ) -> Result<Bytes, LoadError> {
        let path = self.resolve(url);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| LoadError::network(url, e))?;

        if !is_acceptable_status(0, data.len()) {
            return Err(LoadError::network(url, "empty response from local file"));
        }
        debug!("file package {} ({} bytes)", path.display(), data.len());
        on_progress(data.len() as u64, expected_size);
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_source_reads_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("game.data"), b"0123456789").unwrap();
        let source = FileSource::new(dir.path());

        let data = source.fetch("game.data", 10, &|_: u64, _: u64| {}).await.unwrap();
        assert_eq!(&data[..], b"0123456789");
    }

    #[tokio::test]
    async fn test_file_source_resolves_site_absolute_path_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("games/pong")).unwrap();
        std::fs::write(dir.path().join("games/pong/pong.data"), b"pong").unwrap();
        let source = FileSource::new(dir.path());

        let data = source
            .fetch("/games/pong/pong.data", 4, &|_: u64, _: u64| {})
            .await
            .unwrap();
        assert_eq!(&data[..], b"pong");
        assert_eq!(
            source.resolve("/games/pong/pong.data"),
            dir.path().join("games/pong/pong.data")
        );
    }

    #[tokio::test]
    async fn test_file_source_rejects_empty_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.data"), b"").unwrap();
        let source = FileSource::new(dir.path());

        let empty = source.fetch("empty.data", 0, &|_: u64, _: u64| {}).await;
        assert!(matches!(empty, Err(LoadError::Network { .. })));

        let url = format!("file://{}", dir.path().join("missing.data").display());
        let missing = source.fetch(&url, 0, &|_: u64, _: u64| {}).await;
        assert!(matches!(missing, Err(LoadError::Network { .. })));
    }
}
