// Domain layer: hardware model and ports (interfaces).

pub mod model;
pub mod ports;
