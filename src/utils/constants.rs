/// Separations below this are treated as coincident and contribute no force.
pub const SEPARATION_EPSILON: f64 = 1e-10;

/// Side length of the cube particles are scattered in when no extent is given.
/// Bounded domains still use it for the depth (z) axis.
pub const HEADLESS_DOMAIN_SIZE: f64 = 1000.0;

/// Default Barnes-Hut opening angle.
pub const DEFAULT_THETA: f64 = 0.5;

/// Mass given to the distinguished particle when a scenario asks for one.
pub const DEFAULT_HEAVY_MASS: f64 = 20.0;

/// Unit step: `v += F / m`, `x += v`.
pub const DEFAULT_TIME_STEP: f64 = 1.0;

/// Quartering stops here; particles sharing an (x, y) cell at this depth are clustered.
pub const MAX_TREE_DEPTH: usize = 40;
