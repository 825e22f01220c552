// Package sources: where the package bytes come from when the cache cannot serve them.

pub mod file_source;
pub mod http_source;
pub mod traits;
