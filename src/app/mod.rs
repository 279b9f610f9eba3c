// Application layer: wiring shared by the binaries.

pub mod runner;
