use crate::models::Vector3;
use crate::particles::Particle;

/// A bounded x/y window `[0, extent_x] x [0, extent_y]`. Depth (z) is never bounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub extent_x: f64,
    pub extent_y: f64,
}

impl Boundary {
    pub fn new(extent_x: f64, extent_y: f64) -> Self {
        Self { extent_x, extent_y }
    }

    /// Reflects a particle that has left the window back onto its edge.
    ///
    /// Each axis is handled independently: a coordinate strictly outside
    /// `[0, extent]` has its velocity component negated and is clamped.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_nbody::particles::{Boundary, Particle};
    ///
    /// let boundary = Boundary::new(100.0, 50.0);
    /// let mut p = Particle::at_rest(104.9, -2.0, 7.0, 1.0);
    /// p.velocity.x = 5.0;
    /// p.velocity.y = -3.0;
    ///
    /// boundary.reflect(&mut p);
    /// assert_eq!((p.position.x, p.position.y), (100.0, 0.0));
    /// assert_eq!((p.velocity.x, p.velocity.y), (-5.0, 3.0));
    /// ```
    pub fn reflect(&self, p: &mut Particle) {
        if let Some(x) = reflect_axis(p.position.x, self.extent_x) {
            p.position.x = x;
            p.velocity.x = -p.velocity.x;
        }
        if let Some(y) = reflect_axis(p.position.y, self.extent_y) {
            p.position.y = y;
            p.velocity.y = -p.velocity.y;
        }
    }
}

/// Clamped coordinate if `value` lies outside `[0, extent]`.
#[inline]
fn reflect_axis(value: f64, extent: f64) -> Option<f64> {
    if value < 0.0 || value > extent {
        Some(value.clamp(0.0, extent))
    } else {
        None
    }
}

/// Advances one particle by one step under an accumulated `force`.
///
/// `velocity += force / mass * dt`, then `position += velocity * dt`, then the
/// boundary policy if one is configured.
///
/// # Examples
///
/// ```
/// use rs_nbody::models::Vector3;
/// use rs_nbody::particles::{integrate, Particle};
///
/// let mut p = Particle::at_rest(0.0, 0.0, 0.0, 2.0);
/// integrate(&mut p, Vector3::new(4.0, 0.0, -2.0), 1.0, None);
///
/// assert_eq!(p.velocity, Vector3::new(2.0, 0.0, -1.0));
/// assert_eq!(p.position, Vector3::new(2.0, 0.0, -1.0));
/// ```
#[inline]
pub fn integrate(p: &mut Particle, force: Vector3, dt: f64, boundary: Option<&Boundary>) {
    p.velocity += force * (dt / p.mass);
    p.position += p.velocity * dt;
    if let Some(boundary) = boundary {
        boundary.reflect(p);
    }
}
