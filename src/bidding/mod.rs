pub mod gateway;
pub mod model;
pub mod transport;
