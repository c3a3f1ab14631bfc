//! Solver configuration with JSON persistence.
//!
//! One `SolverConfig` describes a whole simulation: domain, particle budget,
//! substepping, gravity, wall handling and material. The per-phase parameter
//! blocks (`AdvectionParams`, `P2gParams`, `G2pParams`) are derived from it.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::advection::{AdvectionParams, BoundaryCondition};
use crate::constants::*;
use crate::dispatch::Dispatch;
use crate::error::{Mpm2DError, Result};
use crate::grid::UniformGrid2DParams;
use crate::model::MaterialModel;
use crate::transfer::{G2pParams, P2gParams};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Domain extent (world units)
    #[serde(
        serialize_with = "crate::serde_utils::serialize_vec2",
        deserialize_with = "crate::serde_utils::deserialize_vec2"
    )]
    pub boundary: Vec2,
    pub cell_size: f32,
    pub particles_count: usize,
    /// Substeps per `Mpm2D::update`
    pub iters_per_frame: u32,
    /// Substep length (s)
    pub timestep: f32,
    #[serde(
        serialize_with = "crate::serde_utils::serialize_vec2",
        deserialize_with = "crate::serde_utils::deserialize_vec2"
    )]
    pub gravity: Vec2,
    /// Wall band in cells
    pub boundary_width: i32,
    #[serde(default)]
    pub boundary_condition: BoundaryCondition,
    pub model: MaterialModel,
    #[serde(default)]
    pub dispatch: Dispatch,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::mpm88(Vec2::from(DEFAULT_BOUNDARY), DEFAULT_PARTICLES_COUNT)
    }
}

impl SolverConfig {
    /// MPM88 scene: 5 substeps of 10 ms, density 1, E = 400.
    pub fn mpm88(boundary: Vec2, particles_count: usize) -> Self {
        Self {
            boundary,
            cell_size: DEFAULT_CELL_SIZE,
            particles_count,
            iters_per_frame: MPM88_ITERS_PER_FRAME,
            timestep: MPM88_TIMESTEP,
            gravity: Vec2::from(DEFAULT_GRAVITY),
            boundary_width: PRESET_BOUNDARY_WIDTH,
            boundary_condition: BoundaryCondition::Separate,
            model: MaterialModel::mpm88(),
            dispatch: Dispatch::Parallel,
        }
    }

    /// Newtonian fluid scene: 2 substeps of 25 ms.
    pub fn newtonian_fluid(boundary: Vec2, particles_count: usize) -> Self {
        Self {
            iters_per_frame: FLUID_ITERS_PER_FRAME,
            timestep: FLUID_TIMESTEP,
            model: MaterialModel::newtonian_fluid(),
            ..Self::mpm88(boundary, particles_count)
        }
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_particles_count(mut self, particles_count: usize) -> Self {
        self.particles_count = particles_count;
        self
    }

    pub fn with_iters_per_frame(mut self, iters: u32) -> Self {
        self.iters_per_frame = iters;
        self
    }

    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_boundary(mut self, width: i32, condition: BoundaryCondition) -> Self {
        self.boundary_width = width;
        self.boundary_condition = condition;
        self
    }

    pub fn with_model(mut self, model: MaterialModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Reject configs the kernels cannot run. Call once before building a solver.
    pub fn validate(&self) -> Result<()> {
        let ug = self.uniform_grid()?;
        if !(self.timestep > 0.0 && self.timestep.is_finite()) {
            return Err(Mpm2DError::InvalidTimestep(self.timestep));
        }
        if self.iters_per_frame == 0 {
            return Err(Mpm2DError::NoIterations);
        }
        if self.boundary_width < 0 || 2 * self.boundary_width >= ug.grid.min_element() {
            return Err(Mpm2DError::InvalidBoundaryWidth {
                width: self.boundary_width,
                grid: ug.grid.to_array(),
            });
        }
        self.model.validate()
    }

    pub fn uniform_grid(&self) -> Result<UniformGrid2DParams> {
        UniformGrid2DParams::try_new(self.boundary, self.cell_size)
    }

    /// Mass of one particle: material density times a quarter cell.
    pub fn particle_mass(&self, ug: &UniformGrid2DParams) -> f32 {
        self.model.particle_density() * ug.particle_volume()
    }

    pub fn advection_params(&self) -> AdvectionParams {
        AdvectionParams {
            timestep: self.timestep,
            gravity: self.gravity,
            boundary_width: self.boundary_width,
            boundary_condition: self.boundary_condition,
        }
    }

    pub fn p2g_params(&self, ug: &UniformGrid2DParams) -> P2gParams {
        P2gParams {
            particles_count: self.particles_count,
            particle_mass: self.particle_mass(ug),
            particle_volume: ug.particle_volume(),
            timestep: self.timestep,
            model: self.model,
        }
    }

    pub fn g2p_params(&self) -> G2pParams {
        G2pParams {
            particles_count: self.particles_count,
            timestep: self.timestep,
        }
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        let mpm88 = SolverConfig::mpm88(Vec2::new(80.0, 160.0), 1024);
        assert!(mpm88.validate().is_ok());
        assert_eq!(mpm88.iters_per_frame, 5);
        assert_eq!(mpm88.timestep, 0.01);

        let fluid = SolverConfig::newtonian_fluid(Vec2::new(80.0, 160.0), 1024);
        assert!(fluid.validate().is_ok());
        assert_eq!(fluid.iters_per_frame, 2);
        assert_eq!(fluid.timestep, 0.025);
        assert_eq!(fluid.boundary_width, PRESET_BOUNDARY_WIDTH);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = SolverConfig::default();
        assert!(matches!(
            base.clone().with_timestep(0.0).validate(),
            Err(Mpm2DError::InvalidTimestep(_))
        ));
        assert!(matches!(
            base.clone().with_iters_per_frame(0).validate(),
            Err(Mpm2DError::NoIterations)
        ));
        assert!(matches!(
            base.clone().with_cell_size(-1.0).validate(),
            Err(Mpm2DError::InvalidCellSize(_))
        ));
        assert!(matches!(
            base.clone()
                .with_boundary(32, BoundaryCondition::Sticky)
                .validate(),
            Err(Mpm2DError::InvalidBoundaryWidth { width: 32, .. })
        ));
    }

    #[test]
    fn test_derived_params() {
        let config = SolverConfig::mpm88(Vec2::splat(16.0), 10).with_cell_size(0.5);
        let ug = config.uniform_grid().unwrap();
        let p2g = config.p2g_params(&ug);
        assert_eq!(ug.grid.x, 32);
        assert!((p2g.particle_volume - 0.0625).abs() < 1e-7);
        assert!((p2g.particle_mass - 0.0625).abs() < 1e-7);
        assert_eq!(config.g2p_params().particles_count, 10);
        assert_eq!(config.advection_params().boundary_width, 3);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{
            "boundary": {"x": 32.0, "y": 32.0},
            "cell_size": 1.0,
            "particles_count": 100,
            "iters_per_frame": 2,
            "timestep": 0.025,
            "gravity": {"x": 0.0, "y": -9.81},
            "boundary_width": 3,
            "model": {"kind": "newtonian_fluid", "rest_density": 1.0,
                      "dynamic_viscosity": 0.1, "eos_stiffness": 2.0, "eos_power": 4.0}
        }"#;
        let config: SolverConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dispatch, Dispatch::Parallel);
        assert_eq!(config.boundary_condition, BoundaryCondition::Separate);
        assert_eq!(config, SolverConfig::newtonian_fluid(Vec2::splat(32.0), 100));
    }
}
