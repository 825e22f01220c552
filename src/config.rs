use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the durable cache database.
pub const DB_NAME: &str = "EM_PRELOAD_CACHE";

/// Schema version of the cache database. Bumping it drops both record stores.
pub const DB_VERSION: u32 = 1;

/// Record store holding `metadata/<key>` -> `{contentHash}`.
pub const METADATA_STORE_NAME: &str = "METADATA";

/// Record store holding `package/<key>` -> blob bytes.
pub const PACKAGE_STORE_NAME: &str = "PACKAGES";

/// Run-dependency name prefix for the package fetch as a whole.
pub const PACKAGE_DEPENDENCY_PREFIX: &str = "datafile_";

/// Run-dependency name prefix for each manifest entry.
pub const FILE_DEPENDENCY_PREFIX: &str = "fp ";

/// Host memory reserved for the game when the deployment does not say (16 MB).
pub const DEFAULT_INITIAL_MEMORY: u64 = 16 * 1024 * 1024;

/// Top-level configuration for the package loader.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory under which the cache database lives.
    pub cache_dir: PathBuf,
    /// Database name, one directory under `cache_dir`.
    pub db_name: String,
    /// Expected schema version of the database.
    pub schema_version: u32,
    /// Disable to run network-only.
    pub persist_cache: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir(),
            db_name: DB_NAME.to_string(),
            schema_version: DB_VERSION,
            persist_cache: true,
        }
    }
}

impl LoaderConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading loader config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing loader config {}", path.display()))
    }

    /// Root directory of the cache database.
    pub fn db_path(&self) -> PathBuf {
        self.cache_dir.join(&self.db_name)
    }
}
