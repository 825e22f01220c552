// Client-side loader for web-delivered game packages: fetch, cache, and hand the
// package bytes to the game runtime's virtual filesystem.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod package;
pub mod source;
pub mod store;

pub use engine::freshness::Freshness;
pub use engine::loader::{LoadReport, LoadState, PackageLoader};
pub use error::{LoadError, StoreError};
