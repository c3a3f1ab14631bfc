//! Small numeric primitives shared by every grid kernel.
//!
//! The atomics here are what make P2G scatter safe: many particles add into
//! the same grid cell from different rayon workers.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::{IVec2, Mat2, Vec2};

/// `f32` with an atomic add, stored as its bit pattern in an `AtomicU32`.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub const fn zero() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Adds `operand` and returns the previous value (CAS retry loop).
    #[inline]
    pub fn fetch_add(&self, operand: f32) -> f32 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f32::from_bits(current) + operand).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(previous) => return f32::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }
}

/// Two independently atomic `f32` components.
///
/// Each component is linearizable on its own; the pair is not updated as a unit.
#[derive(Debug, Default)]
pub struct AtomicVec2 {
    pub x: AtomicF32,
    pub y: AtomicF32,
}

impl AtomicVec2 {
    pub const fn zero() -> Self {
        Self {
            x: AtomicF32::zero(),
            y: AtomicF32::zero(),
        }
    }

    pub fn new(value: Vec2) -> Self {
        Self {
            x: AtomicF32::new(value.x),
            y: AtomicF32::new(value.y),
        }
    }

    #[inline]
    pub fn load(&self) -> Vec2 {
        Vec2::new(self.x.load(), self.y.load())
    }

    #[inline]
    pub fn store(&self, value: Vec2) {
        self.x.store(value.x);
        self.y.store(value.y);
    }
}

/// Atomically accumulate a scalar into shared grid memory. Returns the previous value.
#[inline]
pub fn atomic_add_float(dest: &AtomicF32, operand: f32) -> f32 {
    dest.fetch_add(operand)
}

/// Component-wise atomic accumulation of a 2-vector.
#[inline]
pub fn atomic_add_float2(addr: &AtomicVec2, operand: Vec2) {
    addr.x.fetch_add(operand.x);
    addr.y.fetch_add(operand.y);
}

/// Float → int conversion with cast semantics (truncation toward zero).
#[inline]
pub fn round_to_int(f: Vec2) -> IVec2 {
    f.as_ivec2()
}

#[inline]
pub fn to_float(i: IVec2) -> Vec2 {
    i.as_vec2()
}

/// Component-wise square.
#[inline]
pub fn square(f: Vec2) -> Vec2 {
    f * f
}

#[inline]
pub fn trace(m: &Mat2) -> f32 {
    m.x_axis.x + m.y_axis.y
}

/// `a ⊗ b`: element (row i, column j) is `a[i] * b[j]`.
#[inline]
pub fn outer_product(a: Vec2, b: Vec2) -> Mat2 {
    Mat2::from_cols(a * b.x, a * b.y)
}
