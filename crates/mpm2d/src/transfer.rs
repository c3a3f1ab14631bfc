//! Particle-Grid transfer for 2D MLS-MPM/APIC.
//!
//! P2G: Scatter particle mass, APIC momentum and stress onto the grid with atomics.
//! G2P: Gather grid velocity back, rebuild the affine matrix C, move the particle.
//!
//! Both directions use the same [`Stencil`], so the pair stays adjoint.

use bytemuck::{Pod, Zeroable};
use glam::{Mat2, Vec2};
use rayon::prelude::*;

use crate::constants::{INVALID_PARTICLE_ID, MASS_EPSILON};
use crate::dispatch::Dispatch;
use crate::grid::{GridState, UniformGrid2DParams};
use crate::kernels::{apic_d_inverse, Stencil};
use crate::model::{fluid_pressure, MaterialModel};
use crate::particle::Particles;
use crate::utils::{atomic_add_float, atomic_add_float2, outer_product, trace};

/// Per-step P2G inputs shared by all particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct P2gParams {
    pub particles_count: usize,
    pub particle_mass: f32,
    /// Rest volume (MPM88 stress); the fluid model recomputes volume from grid density
    pub particle_volume: f32,
    pub timestep: f32,
    pub model: MaterialModel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct G2pParams {
    pub particles_count: usize,
    pub timestep: f32,
}

/// Outcome of one G2P invocation.
///
/// `particle_id == -1` marks an out-of-range invocation that touched nothing.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct G2pResult {
    pub particle_id: i32,
    /// `trace(C) * dt`; the driver applies `J *= 1 + new_j_factor`
    pub new_j_factor: f32,
}

impl G2pResult {
    pub const INVALID: Self = Self {
        particle_id: INVALID_PARTICLE_ID,
        new_j_factor: 0.0,
    };

    pub fn is_valid(&self) -> bool {
        self.particle_id >= 0
    }

    /// `(particle index, J factor)` for a valid result.
    pub fn valid(&self) -> Option<(usize, f32)> {
        if self.is_valid() {
            Some((self.particle_id as usize, self.new_j_factor))
        } else {
            None
        }
    }
}

// =============================================================================
// P2G
// =============================================================================

/// Scatter particle `tid` onto the grid.
///
/// MPM88 scatters mass, APIC momentum and the J pressure in one pass. The
/// Newtonian fluid scatters mass and momentum here and its stress in
/// [`run_p2g_fluid_stress`] once every particle's mass has landed.
pub fn run_p2g(
    grid: &GridState,
    particles: &Particles,
    ug: &UniformGrid2DParams,
    params: &P2gParams,
    tid: usize,
) {
    debug_assert!(
        tid < params.particles_count && tid < particles.len(),
        "p2g tid {} out of range (particles_count = {})",
        tid,
        params.particles_count
    );

    let pos = particles.positions[tid];
    let vel = particles.velocities[tid];
    let c = particles.affines[tid];
    let mass = params.particle_mass;

    let affine = match params.model {
        MaterialModel::Mpm88 { youngs_modulus, .. } => {
            let j = particles.jacobians[tid];
            let stress = -params.timestep
                * params.particle_volume
                * apic_d_inverse(ug.cell_size)
                * youngs_modulus
                * (j - 1.0);
            Mat2::from_diagonal(Vec2::splat(stress)) + c * mass
        }
        MaterialModel::NewtonianFluid { .. } => c * mass,
    };

    let stencil = Stencil::new(pos, ug.cell_size);
    for node in stencil.nodes() {
        if !ug.is_in_grid(node.cell) {
            continue;
        }
        let idx = ug.to_cell_index(node.cell) as usize;
        atomic_add_float2(
            &grid.velocities()[idx],
            node.weight * (mass * vel + affine * node.dpos),
        );
        atomic_add_float(&grid.masses()[idx], node.weight * mass);
    }
}

/// Second P2G pass for the Newtonian fluid: density from grid mass, then stress.
///
/// Reads `masses`, writes `velocities` only. No-op for other models.
pub fn run_p2g_fluid_stress(
    grid: &GridState,
    particles: &Particles,
    ug: &UniformGrid2DParams,
    params: &P2gParams,
    tid: usize,
) {
    debug_assert!(
        tid < params.particles_count && tid < particles.len(),
        "p2g stress tid {} out of range (particles_count = {})",
        tid,
        params.particles_count
    );

    let MaterialModel::NewtonianFluid {
        rest_density,
        dynamic_viscosity,
        eos_stiffness,
        eos_power,
    } = params.model
    else {
        return;
    };

    let stencil = Stencil::new(particles.positions[tid], ug.cell_size);

    let mut density = 0.0;
    for node in stencil.nodes() {
        if ug.is_in_grid(node.cell) {
            density += node.weight * grid.mass(ug.to_cell_index(node.cell) as usize);
        }
    }
    density /= ug.cell_volume();
    if density <= MASS_EPSILON {
        return;
    }

    let volume = params.particle_mass / density;
    let pressure = fluid_pressure(density, rest_density, eos_stiffness, eos_power);

    let c = particles.affines[tid];
    let strain = c + c.transpose();
    let stress = Mat2::from_diagonal(Vec2::splat(-pressure)) + strain * dynamic_viscosity;
    let force = stress * (-volume * apic_d_inverse(ug.cell_size) * params.timestep);

    for node in stencil.nodes() {
        if !ug.is_in_grid(node.cell) {
            continue;
        }
        let idx = ug.to_cell_index(node.cell) as usize;
        atomic_add_float2(&grid.velocities()[idx], force * (node.weight * node.dpos));
    }
}

pub fn dispatch_p2g(
    dispatch: Dispatch,
    grid: &GridState,
    particles: &Particles,
    ug: &UniformGrid2DParams,
    params: &P2gParams,
) {
    dispatch.for_each_index(params.particles_count, |tid| {
        run_p2g(grid, particles, ug, params, tid)
    });
}

pub fn dispatch_p2g_fluid_stress(
    dispatch: Dispatch,
    grid: &GridState,
    particles: &Particles,
    ug: &UniformGrid2DParams,
    params: &P2gParams,
) {
    if !params.model.needs_stress_pass() {
        return;
    }
    dispatch.for_each_index(params.particles_count, |tid| {
        run_p2g_fluid_stress(grid, particles, ug, params, tid)
    });
}

// =============================================================================
// G2P
// =============================================================================

/// Gather for one particle. Updates x, v, C in place and returns the J factor.
fn g2p_particle(
    grid: &GridState,
    ug: &UniformGrid2DParams,
    timestep: f32,
    position: &mut Vec2,
    velocity: &mut Vec2,
    affine: &mut Mat2,
) -> f32 {
    let stencil = Stencil::new(*position, ug.cell_size);

    let mut new_v = Vec2::ZERO;
    let mut b = Mat2::ZERO;
    for node in stencil.nodes() {
        if !ug.is_in_grid(node.cell) {
            continue;
        }
        let g_v = grid.velocity(ug.to_cell_index(node.cell) as usize);
        new_v += node.weight * g_v;
        b += outer_product(g_v, node.dpos) * node.weight;
    }
    let new_c = b * apic_d_inverse(ug.cell_size);

    *velocity = new_v;
    *affine = new_c;
    *position += new_v * timestep;

    trace(&new_c) * timestep
}

/// G2P for particle `tid`.
///
/// Out-of-range `tid` returns [`G2pResult::INVALID`] without touching any particle.
pub fn run_g2p(
    grid: &GridState,
    particles: &mut Particles,
    ug: &UniformGrid2DParams,
    params: &G2pParams,
    tid: usize,
) -> G2pResult {
    if tid >= params.particles_count || tid >= particles.len() {
        return G2pResult::INVALID;
    }

    let new_j_factor = g2p_particle(
        grid,
        ug,
        params.timestep,
        &mut particles.positions[tid],
        &mut particles.velocities[tid],
        &mut particles.affines[tid],
    );
    G2pResult {
        particle_id: tid as i32,
        new_j_factor,
    }
}

/// G2P over `0..particles_count`, one result per invocation in `tid` order.
///
/// Jacobians are left alone; merging `new_j_factor` is the caller's job.
pub fn dispatch_g2p(
    dispatch: Dispatch,
    grid: &GridState,
    particles: &mut Particles,
    ug: &UniformGrid2DParams,
    params: &G2pParams,
) -> Vec<G2pResult> {
    let n = params.particles_count.min(particles.len());
    let dt = params.timestep;
    let Particles {
        positions,
        velocities,
        affines,
        ..
    } = particles;

    let kernel = |tid: usize, x: &mut Vec2, v: &mut Vec2, c: &mut Mat2| G2pResult {
        particle_id: tid as i32,
        new_j_factor: g2p_particle(grid, ug, dt, x, v, c),
    };

    let mut results: Vec<G2pResult> = match dispatch {
        Dispatch::Parallel => positions[..n]
            .par_iter_mut()
            .zip(velocities[..n].par_iter_mut())
            .zip(affines[..n].par_iter_mut())
            .enumerate()
            .map(|(tid, ((x, v), c))| kernel(tid, x, v, c))
            .collect(),
        Dispatch::Serial => positions[..n]
            .iter_mut()
            .zip(velocities[..n].iter_mut())
            .zip(affines[..n].iter_mut())
            .enumerate()
            .map(|(tid, ((x, v), c))| kernel(tid, x, v, c))
            .collect(),
    };

    // Invocations past the particle arrays still report, as invalid
    results.resize(params.particles_count.max(n), G2pResult::INVALID);
    results
}
