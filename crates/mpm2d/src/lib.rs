//! 2D Material Point Method core
//!
//! Particles carry material state, a uniform background grid carries momentum.
//! Each substep runs three phases with a full barrier between them:
//!
//! 1. P2G: scatter particle mass and APIC momentum (plus stress) onto the grid
//! 2. Advection: turn grid momentum into velocity, add gravity, apply walls
//! 3. G2P: gather velocity and its gradient back, move particles
//!
//! # Example
//!
//! ```
//! use mpm2d::{Mpm2D, SolverConfig, Vec2};
//!
//! let config = SolverConfig::mpm88(Vec2::new(32.0, 32.0), 256);
//! let mut sim = Mpm2D::new(config).unwrap();
//! sim.fill_centered_square(42).unwrap();
//!
//! // One rendered frame = `iters_per_frame` substeps
//! sim.update();
//! assert_eq!(sim.frame(), 1);
//! ```

pub mod advection;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod grid;
pub mod kernels;
pub mod model;
pub mod particle;
pub mod scene;
pub mod serde_utils;
pub mod transfer;
pub mod utils;

pub use advection::{AdvectionParams, BoundaryCondition};
pub use config::SolverConfig;
pub use dispatch::Dispatch;
pub use error::{Mpm2DError, Result};
pub use glam::{IVec2, Mat2, Vec2};
pub use grid::{GridState, UniformGrid2DParams};
pub use model::MaterialModel;
pub use particle::{Particles, ParticlesInitializer, ParticlesProvider};
pub use transfer::{G2pParams, G2pResult, P2gParams};

use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use constants::GRAVITY_STRENGTH;

/// 2D MPM simulation: owns grid and particle buffers and runs the step loop.
pub struct Mpm2D {
    config: SolverConfig,
    ug: UniformGrid2DParams,
    grid: GridState,
    particles: Particles,

    /// G2P output of the most recent substep
    last_g2p_results: Vec<G2pResult>,

    /// Frames completed by `update`
    frame: u32,
}

impl Mpm2D {
    /// Validate `config` and allocate buffers. Particles start at the origin at rest.
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        let ug = config.uniform_grid()?;

        info!(
            "UniformGrid boundary={:?} grid={:?} cellSize={} cellsCount={}",
            ug.boundary.to_array(),
            ug.grid.to_array(),
            ug.cell_size,
            ug.cells_count
        );
        info!(
            "Mpm2D model={} particles={} iters={} dt={} dispatch={:?}",
            config.model.name(),
            config.particles_count,
            config.iters_per_frame,
            config.timestep,
            config.dispatch
        );

        Ok(Self {
            grid: GridState::for_grid(&ug),
            particles: Particles::new(config.particles_count),
            last_g2p_results: Vec::with_capacity(config.particles_count),
            frame: 0,
            ug,
            config,
        })
    }

    /// Seeded version of the demo layout, see [`scene::fill_centered_square`].
    pub fn fill_centered_square(&mut self, seed: u64) -> Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let count = self.particles.len();
        scene::fill_centered_square(&mut self.particles, self.ug.boundary, count, &mut rng)
    }

    /// Advance one rendered frame (`iters_per_frame` substeps).
    pub fn update(&mut self) {
        for _ in 0..self.config.iters_per_frame {
            self.step();
        }
        self.frame += 1;

        debug!(
            "frame {} ({} iters): grid mass {:.4}, kinetic energy {:.4}",
            self.frame,
            self.config.iters_per_frame,
            self.grid.total_mass(),
            self.kinetic_energy()
        );
    }

    /// One substep: clamp → clear → P2G (→ stress) → advection → G2P → merge J → clamp.
    pub fn step(&mut self) {
        let dispatch = self.config.dispatch;
        let p2g = self.config.p2g_params(&self.ug);

        // 1. Particles placed by `init_particle` may start outside the stencil range
        self.clamp_particles();
        self.grid.clear();

        // 2. Scatter
        transfer::dispatch_p2g(dispatch, &self.grid, &self.particles, &self.ug, &p2g);
        transfer::dispatch_p2g_fluid_stress(dispatch, &self.grid, &self.particles, &self.ug, &p2g);

        // 3. Grid update
        advection::dispatch_advection(
            dispatch,
            &self.grid,
            &self.ug,
            &self.config.advection_params(),
        );

        // 4. Gather
        self.last_g2p_results = transfer::dispatch_g2p(
            dispatch,
            &self.grid,
            &mut self.particles,
            &self.ug,
            &self.config.g2p_params(),
        );

        // 5. Volume change
        let mut invalid = 0usize;
        for result in &self.last_g2p_results {
            match result.valid() {
                Some((i, factor)) => self.particles.jacobians[i] *= 1.0 + factor,
                None => invalid += 1,
            }
        }
        if invalid > 0 {
            warn!("G2P returned {} invalid results", invalid);
        }

        // 6. Keep every stencil on grid nodes
        self.clamp_particles();
    }

    fn clamp_particles(&mut self) {
        let (min, max) = self.ug.particle_bounds();
        self.particles.clamp_to(min, max);
    }

    /// Point gravity along `direction`, keeping magnitude 9.81. Zero or non-finite
    /// directions are ignored.
    pub fn set_gravity(&mut self, direction: Vec2) {
        match direction.try_normalize() {
            Some(dir) => {
                self.config.gravity = dir * GRAVITY_STRENGTH;
                info!("gravity set to {:?}", self.config.gravity.to_array());
            }
            None => warn!(
                "ignoring degenerate gravity direction {:?}",
                direction.to_array()
            ),
        }
    }

    /// Switch material/solver settings, keeping particle x, v and C. J restarts at 1.
    ///
    /// The grid is rebuilt if the domain changed. The particle count always stays.
    pub fn switch_model(&mut self, mut config: SolverConfig) -> Result<()> {
        if config.particles_count != self.particles.len() {
            warn!(
                "switch_model: keeping {} particles (config asked for {})",
                self.particles.len(),
                config.particles_count
            );
            config.particles_count = self.particles.len();
        }
        config.validate()?;

        let ug = config.uniform_grid()?;
        if ug != self.ug {
            self.grid = GridState::for_grid(&ug);
            self.ug = ug;
        }

        info!(
            "switching model {} -> {}",
            self.config.model.name(),
            config.model.name()
        );
        self.particles.reset_jacobians();
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    pub fn uniform_grid(&self) -> &UniformGrid2DParams {
        &self.ug
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut Particles {
        &mut self.particles
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn last_g2p_results(&self) -> &[G2pResult] {
        &self.last_g2p_results
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.particles.kinetic_energy(self.config.particle_mass(&self.ug))
    }
}

impl ParticlesProvider for Mpm2D {
    fn particles_count(&self) -> usize {
        self.particles.len()
    }

    fn positions(&self) -> &[Vec2] {
        &self.particles.positions
    }
}

impl ParticlesInitializer for Mpm2D {
    fn init_particle(&mut self, i: usize, pos: Vec2, vel: Vec2) -> Result<()> {
        self.particles.set(i, pos, vel)
    }
}
