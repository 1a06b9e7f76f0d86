// Domain layer: the ports the demo is written against and the report it produces.

pub mod model;
pub mod ports;
