// Build-time package description: descriptor, manifest, and the deployment record they come from.

pub mod deploy;
pub mod descriptor;
pub mod manifest;
