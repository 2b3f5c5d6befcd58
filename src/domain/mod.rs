// Domain layer: wire-independent model and ports.

pub mod model;
pub mod ports;
