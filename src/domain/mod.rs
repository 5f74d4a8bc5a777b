// Domain layer: booking records and the ports to the managed backend.

pub mod model;
pub mod ports;
