// Error taxonomy. Storage errors are absorbed by the loader; load errors are fatal.

use thiserror::Error;

/// Failure of the durable cache. Never surfaces past the loader.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened or created.
    #[error("cache store unavailable: {0}")]
    Open(String),

    /// A single read or write failed.
    #[error("cache transaction failed: {0}")]
    Transaction(String),
}

impl StoreError {
    pub fn open(err: impl std::fmt::Display) -> Self {
        Self::Open(err.to_string())
    }

    pub fn transaction(err: impl std::fmt::Display) -> Self {
        Self::Transaction(err.to_string())
    }
}

/// Failure that ends a load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The package could not be retrieved from its remote location.
    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// The package bytes are missing or do not fit the manifest.
    #[error("malformed package data: {0}")]
    MalformedData(String),

    /// The host runtime refused an allocation or a virtual file.
    #[error("host runtime error: {0}")]
    Host(String),
}

impl LoadError {
    pub fn network(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        Self::MalformedData(reason.to_string())
    }

    pub fn host(reason: impl std::fmt::Display) -> Self {
        Self::Host(reason.to_string())
    }
}
