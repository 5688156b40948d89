mod particle;
mod particle_forces;
mod integrator;
mod scheduler;
mod particle_store;
#[cfg(feature = "barnes-hut")]
mod particle_interactions_barnes_hut;

pub use particle::*;
pub use particle_forces::*;
pub use integrator::*;
pub use scheduler::*;
pub use particle_store::*;
#[cfg(feature = "barnes-hut")]
pub use particle_interactions_barnes_hut::*;

#[cfg(test)]
mod integrator_tests;
#[cfg(test)]
#[cfg(feature = "barnes-hut")]
mod particle_interactions_barnes_hut_tests;
