// Deployment record embedded next to the package by the packager.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use super::descriptor::PackageDescriptor;
use super::manifest::Manifest;
use crate::config::DEFAULT_INITIAL_MEMORY;

/// Virtual path the whole archive is exposed under when no manifest is given.
pub const DEFAULT_GAME_PATH: &str = "/game.love";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedPackage {
    /// Package file name relative to `prefix_url`.
    pub game_file: String,
    /// Package size in bytes.
    pub game_size: u64,
    /// Content hash of the archive.
    #[serde(default)]
    pub etag: String,
    /// URL path the package is served under, ending in `/`.
    #[serde(default)]
    pub prefix_url: String,
    #[serde(default = "default_initial_memory")]
    pub initial_memory: u64,
    #[serde(default)]
    pub files: Manifest,
}

fn default_initial_memory() -> u64 {
    DEFAULT_INITIAL_MEMORY
}

impl DeployedPackage {
    pub fn from_json(raw: &str) -> Result<Self> {
        let deployed: Self = serde_json::from_str(raw).context("parsing deployment record")?;
        if deployed.game_file.trim().is_empty() {
            return Err(anyhow!("deployment record has no gameFile"));
        }
        if deployed.game_size == 0 {
            return Err(anyhow!("deployment record has no gameSize"));
        }
        Ok(deployed)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading deployment record {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn descriptor(&self) -> PackageDescriptor {
        PackageDescriptor::for_deployment(&self.prefix_url, &self.game_file, self.game_size, &self.etag)
    }

    /// The packaged manifest, or the whole archive as `/game.love`.
    pub fn manifest(&self) -> Manifest {
        if self.files.is_empty() {
            Manifest::single(DEFAULT_GAME_PATH, self.game_size)
        } else {
            self.files.clone()
        }
    }

    /// The runtime's memory must hold at least the whole package.
    pub fn check_memory(&self) -> Result<()> {
        if self.initial_memory < self.game_size {
            return Err(anyhow!(
                "initial memory {} is smaller than the package ({} bytes)",
                self.initial_memory,
                self.game_size
            ));
        }
        Ok(())
    }
}
