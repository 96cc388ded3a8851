// Domain layer: notebook model and the ports to the external collaborators.

pub mod model;
pub mod ports;
