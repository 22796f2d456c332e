pub mod model;
pub mod monitor;
