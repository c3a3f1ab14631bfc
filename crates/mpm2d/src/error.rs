//! Error types for mpm2d.
//!
//! Only setup-time operations (grid/config validation, particle
//! initialization, config I/O) return these. The per-step kernels are total.

use thiserror::Error;

/// Errors raised while building or configuring a simulation.
#[derive(Debug, Error)]
pub enum Mpm2DError {
    /// Cell size must be finite and strictly positive.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),

    /// Timestep must be finite and strictly positive.
    #[error("timestep must be positive and finite, got {0}")]
    InvalidTimestep(f32),

    /// Grid resolution has a non-positive axis.
    #[error("grid resolution must be positive on both axes, got {x}x{y}")]
    EmptyGrid {
        /// Cells along X.
        x: i32,
        /// Cells along Y.
        y: i32,
    },

    /// `cells_count` disagrees with `grid.x * grid.y`.
    #[error("cells_count {got} does not match grid {x}x{y} (expected {expected})")]
    CellsCountMismatch {
        /// Cells along X.
        x: i32,
        /// Cells along Y.
        y: i32,
        /// `x * y`.
        expected: i64,
        /// Stored value.
        got: i32,
    },

    /// Domain extent is not covered by `grid * cell_size`.
    #[error("boundary {boundary:?} is not covered by grid {grid:?} with cell size {cell_size}")]
    BoundaryMismatch {
        /// Domain extent.
        boundary: [f32; 2],
        /// Grid resolution.
        grid: [i32; 2],
        /// Cell edge length.
        cell_size: f32,
    },

    /// Wall band must be non-negative and leave interior cells.
    #[error("boundary width {width} invalid for grid {grid:?}")]
    InvalidBoundaryWidth {
        /// Requested band width in cells.
        width: i32,
        /// Grid resolution.
        grid: [i32; 2],
    },

    /// At least one substep per frame is required.
    #[error("iters_per_frame must be at least 1")]
    NoIterations,

    /// A material parameter is out of its valid range.
    #[error("invalid material parameter `{name}`: {value}")]
    InvalidMaterial {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },

    /// Particle index passed to an initializer is out of range.
    #[error("particle index {index} out of range (particles_count = {count})")]
    ParticleOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of particles.
        count: usize,
    },

    /// Reading or writing a config file failed.
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for `SolverConfig`.
    #[error("config JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for setup-time operations.
pub type Result<T> = std::result::Result<T, Mpm2DError>;
