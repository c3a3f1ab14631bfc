//! Uniform background grid: coordinate/index mapping and per-step grid state.
//!
//! Grid nodes sit at `cell * cell_size`. Flat indices are row-major:
//! `index = j * grid.x + i`.

use bytemuck::{Pod, Zeroable};
use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{Mpm2DError, Result};
use crate::utils::{round_to_int, to_float, AtomicF32, AtomicVec2};

/// Fixed-resolution grid over a rectangular domain.
///
/// `#[repr(C)]` and `Pod` so a device layer can upload it verbatim (24 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct UniformGrid2DParams {
    /// Domain extent in world units
    #[serde(
        serialize_with = "crate::serde_utils::serialize_vec2",
        deserialize_with = "crate::serde_utils::deserialize_vec2"
    )]
    pub boundary: Vec2,
    /// Cells per axis
    #[serde(
        serialize_with = "crate::serde_utils::serialize_ivec2",
        deserialize_with = "crate::serde_utils::deserialize_ivec2"
    )]
    pub grid: IVec2,
    /// World size of one cell
    pub cell_size: f32,
    /// `grid.x * grid.y`
    pub cells_count: i32,
}

impl UniformGrid2DParams {
    /// Cover `boundary` with cells of `cell_size`, rounding the resolution up.
    pub fn new(boundary: Vec2, cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive, got {}", cell_size);
        let grid = round_to_int((boundary / cell_size).ceil());
        Self {
            boundary,
            grid,
            cell_size,
            cells_count: grid.x * grid.y,
        }
    }

    /// Fallible [`UniformGrid2DParams::new`] for configs read from disk.
    pub fn try_new(boundary: Vec2, cell_size: f32) -> Result<Self> {
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(Mpm2DError::InvalidCellSize(cell_size));
        }
        if !boundary.is_finite() {
            return Err(Mpm2DError::BoundaryMismatch {
                boundary: boundary.to_array(),
                grid: [0, 0],
                cell_size,
            });
        }
        let params = Self::new(boundary, cell_size);
        params.validate()?;
        Ok(params)
    }

    /// Grid with an exact resolution; the boundary is `grid * cell_size`.
    pub fn from_resolution(grid: IVec2, cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive, got {}", cell_size);
        Self {
            boundary: to_float(grid) * cell_size,
            grid,
            cell_size,
            cells_count: grid.x * grid.y,
        }
    }

    /// Check the invariants the kernels rely on. Run once at setup, never per step.
    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(Mpm2DError::InvalidCellSize(self.cell_size));
        }
        if self.grid.x <= 0 || self.grid.y <= 0 {
            return Err(Mpm2DError::EmptyGrid {
                x: self.grid.x,
                y: self.grid.y,
            });
        }
        let expected = self.grid.x as i64 * self.grid.y as i64;
        if expected != self.cells_count as i64 {
            return Err(Mpm2DError::CellsCountMismatch {
                x: self.grid.x,
                y: self.grid.y,
                expected,
                got: self.cells_count,
            });
        }
        // boundary ≈ grid * cell_size, allowing the round-up of at most one cell
        let eps = self.cell_size * 1e-4;
        let covered = to_float(self.grid) * self.cell_size;
        let too_small = covered.cmplt(self.boundary - eps).any();
        let too_large = (covered - self.cell_size).cmpge(self.boundary + eps).any();
        if too_small || too_large {
            return Err(Mpm2DError::BoundaryMismatch {
                boundary: self.boundary.to_array(),
                grid: self.grid.to_array(),
                cell_size: self.cell_size,
            });
        }
        Ok(())
    }

    pub fn cells_count(&self) -> usize {
        self.cells_count as usize
    }

    /// Floor-divide a world position into a cell coordinate. May lie outside the grid.
    #[inline]
    pub fn to_cell(&self, pos: Vec2) -> IVec2 {
        round_to_int((pos / self.cell_size).floor())
    }

    /// Flatten a cell coordinate. Only meaningful when [`Self::is_in_grid`] holds.
    #[inline]
    pub fn to_cell_index(&self, cell: IVec2) -> i32 {
        debug_assert!(self.is_in_grid(cell), "cell {:?} outside grid {:?}", cell, self.grid);
        cell.y * self.grid.x + cell.x
    }

    #[inline]
    pub fn pos_to_cell_index(&self, pos: Vec2) -> i32 {
        self.to_cell_index(self.to_cell(pos))
    }

    /// Inverse of [`Self::to_cell_index`] for indices in `[0, cells_count)`.
    #[inline]
    pub fn index_to_cell(&self, cell_index: i32) -> IVec2 {
        IVec2::new(cell_index % self.grid.x, cell_index / self.grid.x)
    }

    #[inline]
    pub fn is_in_grid(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.grid.x && cell.y < self.grid.y
    }

    /// World position of the grid node for `cell`.
    #[inline]
    pub fn node_position(&self, cell: IVec2) -> Vec2 {
        to_float(cell) * self.cell_size
    }

    /// Range of particle positions whose whole 3x3 stencil lies on grid nodes.
    ///
    /// Nodes run from `0` to `(grid - 1) * cell_size`. The stencil base is
    /// `floor(x / dx - 0.5)`, so `base >= 0` needs `x >= 0.5 dx` and
    /// `base + 2 <= grid - 1` needs `x < (grid - 1.5) dx`.
    pub fn particle_bounds(&self) -> (Vec2, Vec2) {
        let min = Vec2::splat(self.cell_size);
        let max = (to_float(self.grid) - 1.5) * self.cell_size - self.cell_size * 1e-3;
        (min, max.max(min))
    }

    /// Area of one cell.
    pub fn cell_volume(&self) -> f32 {
        self.cell_size * self.cell_size
    }

    /// Area represented by one particle: a quarter cell (2x2 particles per cell).
    pub fn particle_volume(&self) -> f32 {
        let half = self.cell_size * 0.5;
        half * half
    }

    /// Raw bytes in the layout shared with device code.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Per-step grid scratch: mass and momentum/velocity per cell.
///
/// Cells are atomics so P2G can scatter from many workers at once. Between
/// P2G and advection `velocities` holds momentum; after advection it holds
/// velocity.
#[derive(Debug)]
pub struct GridState {
    masses: Vec<AtomicF32>,
    velocities: Vec<AtomicVec2>,
}

impl GridState {
    pub fn new(cells_count: usize) -> Self {
        Self {
            masses: (0..cells_count).map(|_| AtomicF32::zero()).collect(),
            velocities: (0..cells_count).map(|_| AtomicVec2::zero()).collect(),
        }
    }

    pub fn for_grid(ug: &UniformGrid2DParams) -> Self {
        Self::new(ug.cells_count())
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    /// Zero every cell before a P2G scatter.
    pub fn clear(&mut self) {
        for m in &self.masses {
            m.store(0.0);
        }
        for v in &self.velocities {
            v.store(Vec2::ZERO);
        }
    }

    pub fn masses(&self) -> &[AtomicF32] {
        &self.masses
    }

    pub fn velocities(&self) -> &[AtomicVec2] {
        &self.velocities
    }

    #[inline]
    pub fn mass(&self, index: usize) -> f32 {
        self.masses[index].load()
    }

    #[inline]
    pub fn velocity(&self, index: usize) -> Vec2 {
        self.velocities[index].load()
    }

    pub fn set_mass(&self, index: usize, mass: f32) {
        self.masses[index].store(mass);
    }

    pub fn set_velocity(&self, index: usize, velocity: Vec2) {
        self.velocities[index].store(velocity);
    }

    pub fn mass_snapshot(&self) -> Vec<f32> {
        self.masses.iter().map(AtomicF32::load).collect()
    }

    pub fn velocity_snapshot(&self) -> Vec<Vec2> {
        self.velocities.iter().map(AtomicVec2::load).collect()
    }

    pub fn total_mass(&self) -> f32 {
        self.masses.iter().map(|m| m.load() as f64).sum::<f64>() as f32
    }

    /// Sum of the momentum field. Only meaningful between P2G and advection.
    pub fn total_momentum(&self) -> Vec2 {
        self.velocities.iter().map(AtomicVec2::load).sum()
    }
}
