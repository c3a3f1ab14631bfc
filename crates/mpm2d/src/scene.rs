//! Initial particle layouts.

use glam::Vec2;
use rand::Rng;

use crate::error::Result;
use crate::particle::ParticlesInitializer;

/// Scatter `count` particles uniformly in a centered square of side
/// `min(boundary) / 2`, thrown mostly downward.
///
/// Velocities: `x ∈ [-0.5, 0.5)`, `y ∈ [-1.5, -0.5)`.
pub fn fill_centered_square<I, R>(
    init: &mut I,
    boundary: Vec2,
    count: usize,
    rng: &mut R,
) -> Result<()>
where
    I: ParticlesInitializer + ?Sized,
    R: Rng,
{
    let side = boundary.min_element() * 0.5;
    let offset = (boundary - Vec2::splat(side)) * 0.5;

    for i in 0..count {
        let pos = offset + Vec2::new(rng.gen_range(0.0..side), rng.gen_range(0.0..side));
        let vel = Vec2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-1.0..0.0) - 0.5);
        init.init_particle(i, pos, vel)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Mpm2DError;
    use crate::particle::Particles;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_fill_stays_in_centered_square() {
        let boundary = Vec2::new(40.0, 80.0);
        let mut particles = Particles::new(500);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        fill_centered_square(&mut particles, boundary, 500, &mut rng).unwrap();

        // side 20, centered: x in [10, 30), y in [30, 50)
        for (p, v) in particles.positions.iter().zip(&particles.velocities) {
            assert!(p.x >= 10.0 && p.x < 30.0, "x = {}", p.x);
            assert!(p.y >= 30.0 && p.y < 50.0, "y = {}", p.y);
            assert!(v.x >= -0.5 && v.x < 0.5);
            assert!(v.y >= -1.5 && v.y < -0.5);
        }
    }

    #[test]
    fn test_fill_is_reproducible() {
        let mut a = Particles::new(32);
        let mut b = Particles::new(32);
        let boundary = Vec2::splat(16.0);
        fill_centered_square(&mut a, boundary, 32, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        fill_centered_square(&mut b, boundary, 32, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.velocities, b.velocities);
    }

    #[test]
    fn test_fill_propagates_initializer_errors() {
        let mut particles = Particles::new(4);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(matches!(
            fill_centered_square(&mut particles, Vec2::splat(16.0), 5, &mut rng),
            Err(Mpm2DError::ParticleOutOfRange { index: 4, count: 4 })
        ));
    }
}
