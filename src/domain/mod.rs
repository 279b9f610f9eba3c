// Domain layer: certificate and compliance types plus the ports the core depends on.

pub mod icon;
pub mod model;
pub mod ports;
pub mod report;
