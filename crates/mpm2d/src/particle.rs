//! Particle storage for the 2D MPM simulation.
//!
//! Structure-of-arrays, one `Vec` per attribute, so each array can be handed
//! to a renderer or split across rayon workers independently.

use glam::{Mat2, Vec2};

use crate::error::{Mpm2DError, Result};

/// All particle state that persists across steps.
#[derive(Clone, Debug, Default)]
pub struct Particles {
    /// World positions
    pub positions: Vec<Vec2>,
    /// Velocities
    pub velocities: Vec<Vec2>,
    /// APIC affine velocity matrices (C)
    pub affines: Vec<Mat2>,
    /// Volume ratio J (1 = undeformed)
    pub jacobians: Vec<f32>,
}

impl Particles {
    /// `count` particles at the origin, at rest and undeformed.
    pub fn new(count: usize) -> Self {
        Self {
            positions: vec![Vec2::ZERO; count],
            velocities: vec![Vec2::ZERO; count],
            affines: vec![Mat2::ZERO; count],
            jacobians: vec![1.0; count],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Place particle `i` with the given velocity, clearing its deformation state.
    pub fn set(&mut self, i: usize, position: Vec2, velocity: Vec2) -> Result<()> {
        if i >= self.len() {
            return Err(Mpm2DError::ParticleOutOfRange {
                index: i,
                count: self.len(),
            });
        }
        self.positions[i] = position;
        self.velocities[i] = velocity;
        self.affines[i] = Mat2::ZERO;
        self.jacobians[i] = 1.0;
        Ok(())
    }

    /// Forget accumulated volume change (used when the material model changes).
    pub fn reset_jacobians(&mut self) {
        self.jacobians.fill(1.0);
    }

    /// Clamp positions into `[min, max]`, zeroing velocity that points further out.
    pub fn clamp_to(&mut self, min: Vec2, max: Vec2) {
        for (pos, vel) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            if pos.x < min.x {
                pos.x = min.x;
                vel.x = vel.x.max(0.0);
            } else if pos.x > max.x {
                pos.x = max.x;
                vel.x = vel.x.min(0.0);
            }
            if pos.y < min.y {
                pos.y = min.y;
                vel.y = vel.y.max(0.0);
            } else if pos.y > max.y {
                pos.y = max.y;
                vel.y = vel.y.min(0.0);
            }
        }
    }

    /// Positions as raw bytes (`[f32; 2]` per particle) for vertex upload.
    pub fn positions_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Σ ½ m |v|² for a uniform particle mass.
    pub fn kinetic_energy(&self, particle_mass: f32) -> f32 {
        0.5 * particle_mass * self.velocities.iter().map(|v| v.length_squared()).sum::<f32>()
    }
}

/// Read access for whoever draws the particles.
pub trait ParticlesProvider {
    fn particles_count(&self) -> usize;

    fn positions(&self) -> &[Vec2];

    fn positions_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.positions())
    }
}

/// Write access for scene setup.
pub trait ParticlesInitializer {
    fn init_particle(&mut self, i: usize, pos: Vec2, vel: Vec2) -> Result<()>;
}

impl ParticlesProvider for Particles {
    fn particles_count(&self) -> usize {
        self.len()
    }

    fn positions(&self) -> &[Vec2] {
        &self.positions
    }
}

impl ParticlesInitializer for Particles {
    fn init_particle(&mut self, i: usize, pos: Vec2, vel: Vec2) -> Result<()> {
        self.set(i, pos, vel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_particles_are_undeformed() {
        let p = Particles::new(3);
        assert_eq!(p.len(), 3);
        assert!(p.jacobians.iter().all(|&j| j == 1.0));
        assert!(p.affines.iter().all(|c| *c == Mat2::ZERO));
    }

    #[test]
    fn test_set_out_of_range() {
        let mut p = Particles::new(2);
        assert!(p.set(1, Vec2::ONE, Vec2::ZERO).is_ok());
        assert!(matches!(
            p.init_particle(2, Vec2::ONE, Vec2::ZERO),
            Err(Mpm2DError::ParticleOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_clamp_to_kills_outward_velocity() {
        let mut p = Particles::new(2);
        p.set(0, Vec2::new(-1.0, 2.0), Vec2::new(-3.0, 1.0)).unwrap();
        p.set(1, Vec2::new(2.0, 9.0), Vec2::new(1.0, 4.0)).unwrap();

        p.clamp_to(Vec2::splat(0.5), Vec2::splat(7.5));

        assert_eq!(p.positions[0], Vec2::new(0.5, 2.0));
        assert_eq!(p.velocities[0], Vec2::new(0.0, 1.0));
        assert_eq!(p.positions[1], Vec2::new(2.0, 7.5));
        assert_eq!(p.velocities[1], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_positions_bytes_layout() {
        let mut p = Particles::new(2);
        p.set(1, Vec2::new(1.0, 2.0), Vec2::ZERO).unwrap();
        let bytes = p.positions_bytes();
        assert_eq!(bytes.len(), 16);
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(floats, &[0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_kinetic_energy() {
        let mut p = Particles::new(2);
        p.set(0, Vec2::ZERO, Vec2::new(3.0, 4.0)).unwrap();
        assert!((p.kinetic_energy(2.0) - 25.0).abs() < 1e-6);
    }
}
