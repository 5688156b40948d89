pub mod errors;
mod constants;
mod simulation_config;

pub use errors::*;
pub use constants::*;
pub use simulation_config::*;
