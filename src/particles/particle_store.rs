//! The double-buffered particle store and its single `advance` entry point.
//!
//! The store owns two equal-length buffers and a selector naming the one that
//! is authoritative. How a step runs depends on the worker count:
//!
//! - One worker: forces are accumulated with pair-halving and applied in place
//!   to the current buffer. The selector does not change.
//! - Several workers: every worker reads the current buffer, writes its own
//!   index range of the other buffer, and the selector flips once all of them
//!   are done.
//!
//! # Example
//!
//! ```
//! use rs_nbody::particles::ParticleStore;
//! use rs_nbody::utils::SimulationConfig;
//!
//! let config = SimulationConfig::new(200, 2, None).with_seed(42);
//! let mut store = ParticleStore::new(config).expect("Failed to create store");
//!
//! store.simulate(3);
//!
//! assert_eq!(store.len(), 200);
//! assert_eq!(store.step_count(), 3);
//! // Three flips starting from buffer 0.
//! assert_eq!(store.current_buffer(), 1);
//! ```
#[cfg(feature = "barnes-hut")]
use bumpalo::Bump;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::Vector3;
use crate::particles::{accumulate_pair_forces, integrate, Boundary, DirectSum, Particle, Scheduler};
#[cfg(feature = "barnes-hut")]
use crate::particles::{tree_arena, BarnesHutEvaluator, ForceEvaluator};
use crate::utils::{ForceMethod, PhysicsError, SimulationConfig};

#[derive(Debug)]
pub struct ParticleStore {
    buffers: [Vec<Particle>; 2],
    current_buffer: usize,
    /// Per-particle force scratch for the single-worker path.
    forces: Vec<Vector3>,
    scheduler: Option<Scheduler>,
    /// Quadtree storage, reset at the start of every step.
    #[cfg(feature = "barnes-hut")]
    arena: Bump,
    boundary: Option<Boundary>,
    config: SimulationConfig,
    steps: u64,
}

impl ParticleStore {
    /// Creates `particle_count` randomly placed particles at rest.
    ///
    /// `domain_extent` of `None` selects the headless cube; `Some((w, h))`
    /// selects a bounded window whose x/y edges reflect particles.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero particle or worker count or an invalid extent.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_nbody::particles::ParticleStore;
    /// use rs_nbody::utils::PhysicsError;
    ///
    /// let store = ParticleStore::create(50, 1, Some((800.0, 600.0))).expect("Failed to create store");
    /// assert!(store.particles().iter().all(|p| p.position.x < 800.0 && p.position.y < 600.0));
    ///
    /// assert_eq!(ParticleStore::create(0, 1, None).err(), Some(PhysicsError::InvalidParticleCount(0)));
    /// ```
    pub fn create(
        particle_count: usize,
        worker_count: usize,
        domain_extent: Option<(f64, f64)>,
    ) -> Result<Self, PhysicsError> {
        Self::new(SimulationConfig::new(particle_count, worker_count, domain_extent))
    }

    /// Creates a store with randomly initialized particles as described by `config`.
    pub fn new(config: SimulationConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        let particles = initial_particles(&config);
        Self::with_particles(config, particles)
    }

    /// Creates a store from an explicit initial state.
    ///
    /// The particle count is taken from `particles`. `config.particle_count`,
    /// `config.seed` and `config.heavy_mass` only shape random initialization and
    /// are ignored here; masses come from `particles` as given.
    ///
    /// # Errors
    ///
    /// Returns an error if `particles` is empty, any mass is invalid, or the rest
    /// of `config` is invalid.
    pub fn from_particles(mut config: SimulationConfig, particles: Vec<Particle>) -> Result<Self, PhysicsError> {
        config.particle_count = particles.len();
        config.validate()?;
        if particles.iter().any(|p| !(p.mass.is_finite() && p.mass > 0.0)) {
            return Err(PhysicsError::InvalidMass);
        }
        Self::with_particles(config, particles)
    }

    fn with_particles(config: SimulationConfig, particles: Vec<Particle>) -> Result<Self, PhysicsError> {
        let n = particles.len();
        if config.worker_count > n {
            warn!(
                "{} workers for {} particles: {} partitions will be empty",
                config.worker_count,
                n,
                config.worker_count - 1
            );
        }
        let scheduler = if config.worker_count > 1 {
            Some(Scheduler::new(config.worker_count)?)
        } else {
            None
        };
        let forces = if scheduler.is_none() { vec![Vector3::zero(); n] } else { Vec::new() };
        info!(
            "created particle store: {} particles, {} workers, {} domain, {} forces",
            n,
            config.worker_count,
            if config.is_bounded() { "bounded" } else { "headless" },
            config.force_method.name()
        );
        #[cfg(feature = "barnes-hut")]
        let arena = match config.force_method {
            ForceMethod::BarnesHut { .. } => tree_arena(n),
            ForceMethod::Direct => Bump::new(),
        };
        Ok(ParticleStore {
            buffers: [particles.clone(), particles],
            current_buffer: 0,
            forces,
            scheduler,
            #[cfg(feature = "barnes-hut")]
            arena,
            boundary: config.domain_extent.map(|(w, h)| Boundary::new(w, h)),
            config,
            steps: 0,
        })
    }

    /// Runs exactly one simulation step.
    pub fn advance(&mut self) {
        self.steps += 1;
        debug!(
            "step {}: {} forces, {} workers",
            self.steps,
            self.config.force_method.name(),
            self.config.worker_count
        );
        #[cfg(feature = "barnes-hut")]
        self.arena.reset();

        match &self.scheduler {
            Some(scheduler) => {
                let dt = self.config.time_step;
                let boundary = self.boundary.as_ref();
                let source_index = self.current_buffer;
                let [first, second] = &mut self.buffers;
                let (source, target) = if source_index == 0 {
                    (&*first, second)
                } else {
                    (&*second, first)
                };

                match self.config.force_method {
                    ForceMethod::Direct => scheduler.run(&DirectSum, source, target, dt, boundary),
                    #[cfg(feature = "barnes-hut")]
                    ForceMethod::BarnesHut { theta } => {
                        let evaluator = BarnesHutEvaluator::new(&self.arena, source, theta);
                        scheduler.run(&evaluator, source, target, dt, boundary);
                    }
                }

                self.current_buffer = 1 - source_index;
            }
            None => self.advance_in_place(),
        }
    }

    /// Runs `steps` consecutive steps.
    pub fn simulate(&mut self, steps: usize) {
        for _ in 0..steps {
            self.advance();
        }
    }

    fn advance_in_place(&mut self) {
        let dt = self.config.time_step;
        let boundary = self.boundary.as_ref();
        let particles = &mut self.buffers[self.current_buffer];
        let forces = &mut self.forces;
        forces.fill(Vector3::zero());

        match self.config.force_method {
            ForceMethod::Direct => accumulate_pair_forces(particles, forces),
            #[cfg(feature = "barnes-hut")]
            ForceMethod::BarnesHut { theta } => {
                let evaluator = BarnesHutEvaluator::new(&self.arena, particles, theta);
                for (i, force) in forces.iter_mut().enumerate() {
                    *force = evaluator.force_on(i, particles);
                }
            }
        }

        for (p, force) in particles.iter_mut().zip(forces.iter()) {
            integrate(p, *force, dt, boundary);
        }
    }

    /// Read-only view of the authoritative buffer.
    pub fn particles(&self) -> &[Particle] {
        &self.buffers[self.current_buffer]
    }

    /// Raw access to either buffer, authoritative or not.
    pub fn buffer(&self, which: usize) -> Option<&[Particle]> {
        self.buffers.get(which).map(Vec::as_slice)
    }

    pub fn current_buffer(&self) -> usize {
        self.current_buffer
    }

    pub fn len(&self) -> usize {
        self.buffers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers[0].is_empty()
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Sum of `mass * velocity` over the authoritative buffer.
    pub fn total_momentum(&self) -> Vector3 {
        self.particles()
            .iter()
            .fold(Vector3::zero(), |acc, p| acc + p.momentum())
    }

    pub fn total_mass(&self) -> f64 {
        self.particles().iter().map(|p| p.mass).sum()
    }
}

/// Uniformly scattered particles at rest with unit mass, plus the optional heavy one.
fn initial_particles(config: &SimulationConfig) -> Vec<Particle> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let (extent_x, extent_y, extent_z) = config.spawn_extent();

    let mut particles: Vec<Particle> = (0..config.particle_count)
        .map(|_| {
            Particle::at_rest(
                rng.random_range(0.0..extent_x),
                rng.random_range(0.0..extent_y),
                rng.random_range(0.0..extent_z),
                1.0,
            )
        })
        .collect();

    if let Some(mass) = config.heavy_mass {
        let heavy = rng.random_range(0..particles.len());
        particles[heavy].mass = mass;
    }
    particles
}
