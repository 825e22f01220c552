pub mod loader_api;
pub mod simple;
