// Domain layer: query-result models and the upstream service port.

pub mod model;
pub mod ports;
