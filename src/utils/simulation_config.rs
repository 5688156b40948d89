use crate::utils::{
    DEFAULT_TIME_STEP, HEADLESS_DOMAIN_SIZE,
    errors::PhysicsError
};
#[cfg(feature = "barnes-hut")]
use crate::utils::DEFAULT_THETA;

/// How the net force on each particle is evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForceMethod {
    /// Exhaustive pairwise evaluation.
    Direct,
    /// Quadtree approximation with the given opening angle.
    #[cfg(feature = "barnes-hut")]
    BarnesHut { theta: f64 },
}

impl ForceMethod {
    /// Barnes-Hut with the default opening angle.
    ///
    /// # Example
    /// ```
    /// use rs_nbody::utils::ForceMethod;
    ///
    /// assert_eq!(ForceMethod::barnes_hut(), ForceMethod::BarnesHut { theta: 0.5 });
    /// ```
    #[cfg(feature = "barnes-hut")]
    pub fn barnes_hut() -> Self {
        ForceMethod::BarnesHut { theta: DEFAULT_THETA }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ForceMethod::Direct => "direct",
            #[cfg(feature = "barnes-hut")]
            ForceMethod::BarnesHut { .. } => "barnes-hut",
        }
    }
}

/// Everything needed to build a [`ParticleStore`](crate::particles::ParticleStore).
///
/// `domain_extent` selects the domain: `None` scatters particles in a headless
/// cube with no boundary, `Some((width, height))` scatters them in that window
/// and reflects them off its x/y edges.
///
/// # Example
/// ```
/// use rs_nbody::utils::{ForceMethod, SimulationConfig};
///
/// let config = SimulationConfig::new(500, 4, Some((800.0, 600.0)))
///     .with_seed(7)
///     .with_heavy_mass(20.0);
///
/// assert!(config.validate().is_ok());
/// assert!(config.is_bounded());
/// assert_eq!(config.force_method, ForceMethod::Direct);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub particle_count: usize,
    pub worker_count: usize,
    pub domain_extent: Option<(f64, f64)>,
    pub force_method: ForceMethod,
    pub time_step: f64,
    pub seed: Option<u64>,
    /// Mass of one randomly chosen particle; `None` keeps every mass at 1.
    pub heavy_mass: Option<f64>,
}


impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            particle_count: 1000,
            worker_count: 1,
            domain_extent: None,
            force_method: ForceMethod::Direct,
            time_step: DEFAULT_TIME_STEP,
            seed: None,
            heavy_mass: None,
        }
    }
}

impl SimulationConfig {
    pub fn new(particle_count: usize, worker_count: usize, domain_extent: Option<(f64, f64)>) -> Self {
        Self {
            particle_count,
            worker_count,
            domain_extent,
            ..Self::default()
        }
    }

    pub fn with_force_method(mut self, force_method: ForceMethod) -> Self {
        self.force_method = force_method;
        self
    }

    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_heavy_mass(mut self, mass: f64) -> Self {
        self.heavy_mass = Some(mass);
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.domain_extent.is_some()
    }

    /// The (x, y, z) extents initial positions are drawn from.
    pub fn spawn_extent(&self) -> (f64, f64, f64) {
        match self.domain_extent {
            Some((w, h)) => (w, h, HEADLESS_DOMAIN_SIZE),
            None => (HEADLESS_DOMAIN_SIZE, HEADLESS_DOMAIN_SIZE, HEADLESS_DOMAIN_SIZE),
        }
    }

    /// Rejects configurations that would make a step ill-defined.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if self.particle_count == 0 { return Err(PhysicsError::InvalidParticleCount(self.particle_count)); }
        if self.worker_count == 0 { return Err(PhysicsError::InvalidWorkerCount(self.worker_count)); }
        if let Some((w, h)) = self.domain_extent {
            if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) { return Err(PhysicsError::InvalidExtent); }
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) { return Err(PhysicsError::InvalidTimeStep); }
        if let Some(m) = self.heavy_mass {
            if !(m.is_finite() && m > 0.0) { return Err(PhysicsError::InvalidMass); }
        }
        #[cfg(feature = "barnes-hut")]
        if let ForceMethod::BarnesHut { theta } = self.force_method {
            if !(theta.is_finite() && theta >= 0.0) { return Err(PhysicsError::InvalidTheta); }
        }
        Ok(())
    }
}
