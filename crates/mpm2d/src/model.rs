//! Material models: how particle state turns into grid forces during P2G.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Mpm2DError, Result};

/// Constitutive model used by P2G.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialModel {
    /// Weakly compressible fluid with pressure `E * (J - 1)` (taichi mpm88).
    Mpm88 { density: f32, youngs_modulus: f32 },
    /// Viscous fluid with a Tait-style equation of state. Needs a second P2G pass
    /// to read grid density back before scattering stress.
    NewtonianFluid {
        rest_density: f32,
        dynamic_viscosity: f32,
        eos_stiffness: f32,
        eos_power: f32,
    },
}

impl Default for MaterialModel {
    fn default() -> Self {
        Self::mpm88()
    }
}

impl MaterialModel {
    pub fn mpm88() -> Self {
        Self::Mpm88 {
            density: MPM88_DENSITY,
            youngs_modulus: MPM88_YOUNGS_MODULUS,
        }
    }

    pub fn newtonian_fluid() -> Self {
        Self::NewtonianFluid {
            rest_density: FLUID_REST_DENSITY,
            dynamic_viscosity: FLUID_DYNAMIC_VISCOSITY,
            eos_stiffness: FLUID_EOS_STIFFNESS,
            eos_power: FLUID_EOS_POWER,
        }
    }

    /// Density used to derive per-particle mass from particle volume.
    pub fn particle_density(&self) -> f32 {
        match *self {
            Self::Mpm88 { density, .. } => density,
            Self::NewtonianFluid { rest_density, .. } => rest_density,
        }
    }

    /// Whether P2G needs the density/stress pass after the mass pass.
    pub fn needs_stress_pass(&self) -> bool {
        matches!(self, Self::NewtonianFluid { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mpm88 { .. } => "mpm88",
            Self::NewtonianFluid { .. } => "newtonian_fluid",
        }
    }

    pub fn validate(&self) -> Result<()> {
        fn positive(name: &'static str, value: f32) -> Result<()> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(Mpm2DError::InvalidMaterial { name, value })
            }
        }

        match *self {
            Self::Mpm88 {
                density,
                youngs_modulus,
            } => {
                positive("density", density)?;
                positive("youngs_modulus", youngs_modulus)
            }
            Self::NewtonianFluid {
                rest_density,
                dynamic_viscosity,
                eos_stiffness,
                eos_power,
            } => {
                positive("rest_density", rest_density)?;
                if !(dynamic_viscosity >= 0.0 && dynamic_viscosity.is_finite()) {
                    return Err(Mpm2DError::InvalidMaterial {
                        name: "dynamic_viscosity",
                        value: dynamic_viscosity,
                    });
                }
                positive("eos_stiffness", eos_stiffness)?;
                positive("eos_power", eos_power)
            }
        }
    }
}

/// Equation-of-state pressure for the Newtonian fluid, floored at [`MIN_FLUID_PRESSURE`].
#[inline]
pub fn fluid_pressure(
    density: f32,
    rest_density: f32,
    eos_stiffness: f32,
    eos_power: f32,
) -> f32 {
    let p = eos_stiffness * ((density / rest_density).powf(eos_power) - 1.0);
    p.max(MIN_FLUID_PRESSURE)
}
