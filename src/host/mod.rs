// Game runtime collaborator: run dependencies, host memory, and the virtual filesystem.

pub mod memory_host;
pub mod traits;
