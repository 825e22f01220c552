// Load orchestration around the per-load state machine.

pub mod freshness;
pub mod loader;
pub mod materializer;
pub mod stats;
pub mod status;
pub mod writer;
