use crate::models::Vector3;
use crate::utils::PhysicsError;

/// A point mass. Particles have no identity beyond their index in a buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vector3,
    pub velocity: Vector3,
    pub mass: f64,
}

impl Particle {
    /// Creates a new Particle.
    ///
    /// # Errors
    ///
    /// Returns an error if `mass` is non-positive or not finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_nbody::models::Vector3;
    /// use rs_nbody::particles::Particle;
    /// use rs_nbody::utils::PhysicsError;
    ///
    /// let particle = Particle::new(Vector3::new(1.0, 2.0, 3.0), Vector3::zero(), 2.0)
    ///     .expect("Failed to create particle");
    /// assert_eq!(particle.mass, 2.0);
    ///
    /// let invalid = Particle::new(Vector3::zero(), Vector3::zero(), 0.0);
    /// assert_eq!(invalid, Err(PhysicsError::InvalidMass));
    /// ```
    pub fn new(position: Vector3, velocity: Vector3, mass: f64) -> Result<Self, PhysicsError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(PhysicsError::InvalidMass);
        }
        Ok(Particle { position, velocity, mass })
    }

    /// A particle with zero velocity.
    ///
    /// Mass is not validated; use [`Particle::new`] for untrusted input.
    pub fn at_rest(x: f64, y: f64, z: f64, mass: f64) -> Self {
        Particle {
            position: Vector3::new(x, y, z),
            velocity: Vector3::zero(),
            mass,
        }
    }

    pub fn momentum(&self) -> Vector3 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }
}
