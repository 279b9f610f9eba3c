// Adapters layer: concrete certificate sources and registration providers.

pub mod filesystem;
pub mod memory;
