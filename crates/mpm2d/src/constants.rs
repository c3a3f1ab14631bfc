//! Physical and numerical constants for the 2D MPM core.

/// Gravity magnitude (m/s²). `Mpm2D::set_gravity` rescales any direction to this length.
pub const GRAVITY_STRENGTH: f32 = 9.81;

/// Default gravity vector, pointing down the Y axis.
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, -GRAVITY_STRENGTH];

/// Grid mass at or below this is treated as "no particle contributed".
pub const MASS_EPSILON: f32 = 1e-10;

/// Floor for the equation-of-state pressure (prevents strong tensile clumping).
pub const MIN_FLUID_PRESSURE: f32 = -0.1;

/// Width of the quadratic B-spline stencil, in grid nodes per axis.
pub const STENCIL_WIDTH: usize = 3;

/// Boundary band used by the config presets (taichi mpm88 `bound`).
pub const PRESET_BOUNDARY_WIDTH: i32 = 3;

/// Cell edge length of the demo scenes.
pub const DEFAULT_CELL_SIZE: f32 = 1.0;

/// Domain extent used when no boundary is given.
pub const DEFAULT_BOUNDARY: [f32; 2] = [64.0, 64.0];

/// Particle count of the demo scenes.
pub const DEFAULT_PARTICLES_COUNT: usize = 16384;

/// Sentinel `particle_id` for a G2P invocation outside `[0, particles_count)`.
pub const INVALID_PARTICLE_ID: i32 = -1;

// =============================================================================
// Preset material parameters for the demo scenes
// =============================================================================

/// MPM88: particle density.
pub const MPM88_DENSITY: f32 = 1.0;

/// MPM88: Young's modulus for the J-based pressure.
pub const MPM88_YOUNGS_MODULUS: f32 = 400.0;

/// MPM88: substeps per rendered frame.
pub const MPM88_ITERS_PER_FRAME: u32 = 5;

/// MPM88: substep length (s).
pub const MPM88_TIMESTEP: f32 = 10.0 / 1e3;

/// Newtonian fluid: rest density.
pub const FLUID_REST_DENSITY: f32 = 1.0;

/// Newtonian fluid: dynamic viscosity.
pub const FLUID_DYNAMIC_VISCOSITY: f32 = 0.1;

/// Newtonian fluid: equation-of-state stiffness.
pub const FLUID_EOS_STIFFNESS: f32 = 2.0;

/// Newtonian fluid: equation-of-state exponent.
pub const FLUID_EOS_POWER: f32 = 4.0;

/// Newtonian fluid: substeps per rendered frame.
pub const FLUID_ITERS_PER_FRAME: u32 = 2;

/// Newtonian fluid: substep length (s).
pub const FLUID_TIMESTEP: f32 = 25.0 / 1e3;
