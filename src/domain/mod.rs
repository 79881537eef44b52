// Domain layer: address metadata models and ports. No I/O here.

pub mod address_format;
pub mod field;
pub mod model;
pub mod ports;
pub mod subdivision;
