// Domain layer: models, run settings and ports (interfaces).

pub mod model;
pub mod ports;
pub mod settings;
