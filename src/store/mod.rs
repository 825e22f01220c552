// Durable package cache: a metadata record store and a blob record store under one database.

pub mod fs_store;
pub mod memory_store;
pub mod traits;

use serde::{Deserialize, Serialize};

/// Value of a `metadata/<key>` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub content_hash: String,
}

pub fn metadata_record_key(cache_key: &str) -> String {
    format!("metadata/{}", cache_key)
}

pub fn package_record_key(cache_key: &str) -> String {
    format!("package/{}", cache_key)
}
