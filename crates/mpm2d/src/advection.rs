//! Grid velocity integration: momentum → velocity, gravity, wall boundary.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::constants::MASS_EPSILON;
use crate::dispatch::Dispatch;
use crate::grid::{GridState, UniformGrid2DParams};

/// What happens to grid velocity inside the wall band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryCondition {
    /// Zero only the component pointing into the wall (free slip, can separate)
    #[default]
    Separate,
    /// Zero the whole velocity (no slip)
    Sticky,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdvectionParams {
    pub timestep: f32,
    pub gravity: Vec2,
    /// Cells from each edge that count as wall
    pub boundary_width: i32,
    pub boundary_condition: BoundaryCondition,
}

impl AdvectionParams {
    /// Edge cells only, separating walls.
    pub fn new(timestep: f32, gravity: Vec2) -> Self {
        Self {
            timestep,
            gravity,
            boundary_width: 1,
            boundary_condition: BoundaryCondition::Separate,
        }
    }
}

/// Apply the wall rule to velocity `v` of `cell`.
#[inline]
pub fn apply_boundary(
    cell: IVec2,
    v: Vec2,
    ug: &UniformGrid2DParams,
    width: i32,
    condition: BoundaryCondition,
) -> Vec2 {
    let low = cell.cmplt(IVec2::splat(width));
    let high = cell.cmpge(ug.grid - width);

    match condition {
        BoundaryCondition::Sticky => {
            if low.any() || high.any() {
                Vec2::ZERO
            } else {
                v
            }
        }
        BoundaryCondition::Separate => {
            let mut v = v;
            if (low.x && v.x < 0.0) || (high.x && v.x > 0.0) {
                v.x = 0.0;
            }
            if (low.y && v.y < 0.0) || (high.y && v.y > 0.0) {
                v.y = 0.0;
            }
            v
        }
    }
}

/// Advection for grid cell `tid`.
///
/// Expects `velocities[tid]` to hold momentum from P2G and leaves velocity there.
/// Cells without mass are left untouched.
pub fn run_advection(
    grid: &GridState,
    ug: &UniformGrid2DParams,
    params: &AdvectionParams,
    tid: usize,
) {
    debug_assert!(
        tid < ug.cells_count(),
        "advection tid {} >= cells_count {}",
        tid,
        ug.cells_count
    );

    let mass = grid.mass(tid);
    if mass <= MASS_EPSILON {
        return;
    }

    let mut v = grid.velocity(tid) / mass;
    v += params.gravity * params.timestep;

    let cell = ug.index_to_cell(tid as i32);
    v = apply_boundary(cell, v, ug, params.boundary_width, params.boundary_condition);

    grid.set_velocity(tid, v);
}

/// Advect every grid cell. Returns once all cells are written.
pub fn dispatch_advection(
    dispatch: Dispatch,
    grid: &GridState,
    ug: &UniformGrid2DParams,
    params: &AdvectionParams,
) {
    dispatch.for_each_index(ug.cells_count(), |tid| run_advection(grid, ug, params, tid));
}
