//! Gravitational force evaluation.
//!
//! Two exact strategies are provided and they are deliberately kept apart:
//!
//! - [`accumulate_pair_forces`] visits every unordered pair once and applies the
//!   result to both particles. It halves the arithmetic but writes to both ends
//!   of a pair, so it needs exclusive access to every accumulator.
//! - [`DirectSum`] computes the force on one particle from every other particle.
//!   It only reads the particle set, so disjoint index ranges can be evaluated
//!   concurrently at twice the arithmetic cost.
//!
//! Both use [`pairwise_force`], with the gravitational constant folded to 1.
use crate::models::Vector3;
use crate::particles::Particle;
use crate::utils::SEPARATION_EPSILON;

/// Force exerted on `a` by `b`: `m_a * m_b / r^3` along `b - a`.
///
/// Returns zero when the particles are closer than [`SEPARATION_EPSILON`].
/// `pairwise_force(a, b) == -pairwise_force(b, a)` holds exactly.
///
/// # Examples
///
/// ```
/// use rs_nbody::particles::{pairwise_force, Particle};
///
/// let a = Particle::at_rest(0.0, 0.0, 0.0, 2.0);
/// let b = Particle::at_rest(2.0, 0.0, 0.0, 3.0);
///
/// let f = pairwise_force(&a, &b);
/// // 2 * 3 / 2^2
/// assert!((f.x - 1.5).abs() < 1e-12);
/// assert_eq!(pairwise_force(&b, &a), -f);
/// ```
#[inline]
pub fn pairwise_force(a: &Particle, b: &Particle) -> Vector3 {
    point_mass_force(a.position, a.mass, b.position, b.mass)
}

/// Force on a mass at `position` from a point mass `other_mass` at `other`.
///
/// Shared by the exact kernels and by spatial-index nodes standing in for many particles.
#[inline]
pub(crate) fn point_mass_force(position: Vector3, mass: f64, other: Vector3, other_mass: f64) -> Vector3 {
    let d = other - position;
    let dist = d.norm();
    if dist < SEPARATION_EPSILON {
        return Vector3::zero();
    }
    d * (mass * other_mass / (dist * dist * dist))
}

/// Pair-halving accumulation: adds the net force on every particle into `forces`.
///
/// Each unordered pair (i < j) is evaluated once; `+f` goes to i and `-f` to j.
/// `forces` is not cleared first.
///
/// # Panics
///
/// Panics if `forces` is shorter than `particles`.
pub fn accumulate_pair_forces(particles: &[Particle], forces: &mut [Vector3]) {
    assert!(forces.len() >= particles.len(), "force accumulator shorter than particle set");
    for (i, p) in particles.iter().enumerate() {
        for (j, q) in particles.iter().enumerate().skip(i + 1) {
            let f = pairwise_force(p, q);
            forces[i] += f;
            forces[j] -= f;
        }
    }
}

/// Computes the net force on one particle from a read-only particle set.
///
/// Implementations must only read `particles`, which is what lets the
/// scheduler evaluate disjoint index ranges on different workers.
pub trait ForceEvaluator: Sync {
    fn force_on(&self, index: usize, particles: &[Particle]) -> Vector3;
}

/// Full-sweep exact evaluation over every ordered pair (index, j).
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSum;

impl ForceEvaluator for DirectSum {
    fn force_on(&self, index: usize, particles: &[Particle]) -> Vector3 {
        let p = &particles[index];
        let mut total = Vector3::zero();
        for (j, q) in particles.iter().enumerate() {
            if j == index {
                continue;
            }
            total += pairwise_force(p, q);
        }
        total
    }
}
