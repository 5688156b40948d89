use std::fmt;
use std::error::Error;

/// Represents errors that can occur while constructing or configuring a simulation.
///
/// Stepping itself never fails: coincident particles are a defined edge case
/// contributing zero force, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Indicates a particle count of zero.
    InvalidParticleCount(usize),
    /// Indicates a worker count of zero.
    InvalidWorkerCount(usize),
    /// Indicates an invalid mass value (e.g., negative, zero or non-finite mass).
    InvalidMass,
    /// Indicates a non-positive or non-finite domain extent.
    InvalidExtent,
    /// Indicates a non-positive or non-finite time step.
    InvalidTimeStep,
    /// Indicates a negative or non-finite opening angle.
    InvalidTheta,
    /// The worker pool could not be started.
    ThreadPool(String),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PhysicsError::InvalidParticleCount(n) => write!(f, "Invalid particle count: {}", n),
            PhysicsError::InvalidWorkerCount(n) => write!(f, "Invalid worker count: {}", n),
            PhysicsError::InvalidMass => write!(f, "Invalid mass value"),
            PhysicsError::InvalidExtent => write!(f, "Invalid domain extent"),
            PhysicsError::InvalidTimeStep => write!(f, "Invalid time step"),
            PhysicsError::InvalidTheta => write!(f, "Invalid opening angle"),
            PhysicsError::ThreadPool(msg) => write!(f, "Worker pool error: {}", msg),
        }
    }
}


impl Error for PhysicsError {}
