//! Quadratic B-spline interpolation stencil for P2G/G2P.
//!
//! P2G and G2P must build weights from the same [`Stencil`], otherwise the
//! scatter and gather stop being adjoint and momentum leaks.

use glam::{IVec2, Vec2};

use crate::constants::STENCIL_WIDTH;
use crate::utils::{round_to_int, square, to_float};

/// APIC D matrix inverse for quadratic B-splines.
/// D = (1/4) * dx^2 * I, so D_inv = 4 / dx^2
#[inline]
pub fn apic_d_inverse(cell_size: f32) -> f32 {
    4.0 / (cell_size * cell_size)
}

/// 3x3 neighbourhood of grid nodes around one particle.
#[derive(Clone, Copy, Debug)]
pub struct Stencil {
    /// Lower-left node of the stencil
    pub base: IVec2,
    /// Particle position relative to `base`, in cells. Each component is in [0.5, 1.5).
    pub fx: Vec2,
    /// Per-axis weights for offsets 0, 1, 2
    pub weights: [Vec2; STENCIL_WIDTH],
    cell_size: f32,
}

/// One stencil node: its cell, its weight and `node_position - particle_position`.
#[derive(Clone, Copy, Debug)]
pub struct StencilNode {
    pub cell: IVec2,
    pub weight: f32,
    pub dpos: Vec2,
}

impl Stencil {
    pub fn new(pos: Vec2, cell_size: f32) -> Self {
        let xp = pos / cell_size;
        let base = round_to_int((xp - 0.5).floor());
        let fx = xp - to_float(base);
        let weights = [
            0.5 * square(1.5 - fx),
            0.75 - square(fx - 1.0),
            0.5 * square(fx - 0.5),
        ];
        Self {
            base,
            fx,
            weights,
            cell_size,
        }
    }

    /// All nine nodes, x-major. Out-of-grid nodes are included; callers filter.
    pub fn nodes(&self) -> impl Iterator<Item = StencilNode> + '_ {
        (0..STENCIL_WIDTH).flat_map(move |i| {
            (0..STENCIL_WIDTH).map(move |j| {
                let offset = IVec2::new(i as i32, j as i32);
                StencilNode {
                    cell: self.base + offset,
                    weight: self.weights[i].x * self.weights[j].y,
                    dpos: (to_float(offset) - self.fx) * self.cell_size,
                }
            })
        })
    }
}
